pub mod assets;
pub mod ddl;
pub mod meditations;
