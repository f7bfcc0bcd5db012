//! safety-gate - Statistical release gating for model safety regressions
//!
//! This library compares the safety metrics of a baseline and a candidate
//! release and decides whether the candidate may ship (OK), ships with
//! caution (WARN) or must not ship (BLOCK). It combines threshold grading,
//! bootstrap / permutation significance testing, a business-risk overlay
//! and multi-release erosion trends.

pub mod adapter;
pub mod cli;
pub mod config_loader;
pub mod gate;
pub mod history;
pub mod report;
pub mod runner;
