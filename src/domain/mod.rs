pub mod day_crossing;
pub mod duplicate;
pub mod merge;
pub mod models;
pub mod shift_time;
pub mod time_slots;
pub mod visual_style;
