// User-level configuration loading

pub mod settings;

pub use settings::Settings;
