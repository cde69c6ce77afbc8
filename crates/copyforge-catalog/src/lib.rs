//! Static catalogs for copyforge.
//!
//! Two read-only tables are compiled into the binary and shared by every
//! request:
//!
//! - The **model catalog**: which inference vendor owns each model id, plus
//!   display metadata for the picker UI.
//! - The **skill catalog**: the copywriting modules a user can select to
//!   steer generation.
//!
//! Both tables are immutable after process start; this crate exposes read
//! accessors only.

pub mod models;
pub mod skills;

pub use models::{
    DEFAULT_MODEL, DEFAULT_VENDOR, ModelInfo, Vendor, all_models, find_model, resolve_vendor,
};
pub use skills::{SkillInfo, all_skills, find_skill};
