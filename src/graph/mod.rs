//! # Filter Graph Builder
//!
//! Composes the optional pre-normalization stages into one labeled filter
//! graph. Stages run in a fixed order:
//!
//! ```text
//! [0:a] ─► de-esser ─► multiband (dynamic EQ / stereo width) ─► glue ─► [output]
//! ```
//!
//! A disabled stage passes its input label through untouched, so any subset
//! of stages still yields a connected graph. With every stage disabled the
//! graph is empty and its output is the raw source.

pub mod builder;
pub mod stages;

pub use builder::{build_graph, plan_stages, FilterGraphDescriptor, Stage, SOURCE_LABEL};
pub use stages::{
    BandBranch, BandTuning, CompandParams, DeesserParams, GlueParams, LimiterParams, MultibandParams,
    StereoWidthParams,
};
