//! CVForge API: draft persistence, one-page fitting, PDF/DOCX export and the AI
//! assist actions behind a small axum service.

pub mod ai_client;
pub mod applications;
pub mod config;
pub mod drafts;
pub mod errors;
pub mod export;
pub mod layout;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
pub mod upload;
