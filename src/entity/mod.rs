pub mod prototype;
pub mod registry;

pub use prototype::{MonsterPrototype, MonsterStats};
pub use registry::PrototypeRegistry;
