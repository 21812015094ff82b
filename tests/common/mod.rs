#![allow(dead_code)]

use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Health(pub i32);

#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Mass(pub i32);

/// Shared (per-partition) value; deliberately not `Pod`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Biome(pub String);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
