// src/lib.rs

//! Gazette: aggregates official, community and art feeds into one
//! consolidated news snapshot.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
