// Library root
// -----------
// Uploads images to the asset API, polls the asynchronous operations each
// upload starts, and records which uploads resolved and which are still
// pending so a later run can pick them up.
//
// Module responsibilities:
// - `api`: HTTP calls (create-asset, get-operation) behind the `AssetApi`
//   trait, plus response parsing.
// - `submit` / `poll` / `reconcile`: the submit-then-poll pipeline.
// - `store`: reading and writing the JSON result files.
// - `run`: the upload and retry entry points wiring the above together.
// - `ui`: interactive menu and run summaries.
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod poll;
pub mod reconcile;
pub mod run;
pub mod store;
pub mod submit;
pub mod ui;

pub use error::{Result, UploaderError};
