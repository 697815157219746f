pub mod map;
pub mod value;

pub use map::ConfigMap;
pub use value::ConfigValue;
