pub mod clean;
pub mod doctor;
pub mod list;
pub mod resume;
pub mod scrape;
pub mod setup;
