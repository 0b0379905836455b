// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the command flows.
//
// Module responsibilities:
// - `api`: Encapsulates HTTP interactions with the Immich server
//   (asset lookup, motion-photo search, transcode job submission) and
//   the server URL normalization.
// - `ui`: Implements the terminal flows (single asset / whole library)
//   and delegates requests to `api`.
//
// Keeping this separation makes it easier to test the API logic or
// drive the client from another front end in the future.
pub mod api;
pub mod ui;
