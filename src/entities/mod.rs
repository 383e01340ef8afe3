// Entity Models
//
// A Place is identified by its provider id (never changes once fetched).
// A ReviewRecord belongs to the append-only review log and points back at
// its place by id (and, for older logs, only by name).

pub mod place;
pub mod review;

pub use place::Place;
pub use review::{Emotion, ReviewRecord, UNKNOWN_EMOTION};
