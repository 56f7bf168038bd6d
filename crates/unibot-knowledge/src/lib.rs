//! # unibot-knowledge
//!
//! Everything unibot knows: the pgvector document store, the reference
//! tables (campus map, FAQ, locker and servery hours), handbook PDFs in
//! Supabase Storage, and the interaction log.

pub mod interactions;
pub mod storage;
pub mod store;

pub use interactions::{Interaction, InteractionLog, InteractionStatus};
pub use storage::{major_from_file_name, Handbook, HandbookCatalog, HandbookStorage};
pub use store::{FaqEntry, KnowledgeStore, Location, LockerRow, ServeryRow};
