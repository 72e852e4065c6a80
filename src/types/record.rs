use chrono::{DateTime, Local};

use crate::shape::ShapeKind;

/// 通过速度门限、写入记录文件的一条样本
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedSample {
    pub timestamp: DateTime<Local>,
    pub shape: ShapeKind,
    /// 本轮已完成的重复次数（即当前重复的序号，从 0 开始）
    pub repetition: u32,
    pub x: i32,
    pub y: i32,
}

impl AcceptedSample {
    pub fn new(timestamp: DateTime<Local>, shape: ShapeKind, repetition: u32, x: i32, y: i32) -> Self {
        Self {
            timestamp,
            shape,
            repetition,
            x,
            y,
        }
    }
}
