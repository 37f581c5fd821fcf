mod facility_user;
pub use facility_user::{FacilityUser, FacilityUserCreateUpdate};

mod video_log;
pub use video_log::{VideoLog, VideoLogCreate};

mod exercise_log;
pub use exercise_log::{
    ExerciseLog, ExerciseLogCreate, ExerciseStatus, MASTERY_STREAK, MasteryState,
    STRUGGLING_ATTEMPTS,
};

mod video_file;
pub use video_file::{VideoFile, VideoFileCreate};

mod settings;
pub use settings::{SettingValue, Settings};
