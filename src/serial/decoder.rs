use std::fmt;

use crate::types::OrientationSample;

/// 字段分隔符
pub const FIELD_DELIMITER: char = ',';
/// 一帧固定的字段数：id,pitch,yaw
pub const FIELD_COUNT: usize = 3;

/// 丢弃一行的原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    FieldCount(usize),
    InvalidNumber,
    NonFinite,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "empty line"),
            SkipReason::FieldCount(n) => write!(f, "expected {} fields, got {}", FIELD_COUNT, n),
            SkipReason::InvalidNumber => write!(f, "pitch/yaw is not a number"),
            SkipReason::NonFinite => write!(f, "pitch/yaw is not finite"),
        }
    }
}

/// 单行解码结果，噪声行是常态，不作为错误处理
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodeResult {
    Sample(OrientationSample),
    Skip(SkipReason),
}

/// 解码一行串口文本 `id,pitch,yaw`
///
/// 每行独立处理，截断的行直接丢弃。id 字段不参与计算。
pub fn decode_line(line: &str) -> DecodeResult {
    let line = line.trim();
    if line.is_empty() {
        return DecodeResult::Skip(SkipReason::Empty);
    }

    let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
    if fields.len() != FIELD_COUNT {
        return DecodeResult::Skip(SkipReason::FieldCount(fields.len()));
    }

    let (pitch, yaw) = match (fields[1].trim().parse::<f64>(), fields[2].trim().parse::<f64>()) {
        (Ok(pitch), Ok(yaw)) => (pitch, yaw),
        _ => return DecodeResult::Skip(SkipReason::InvalidNumber),
    };

    if !pitch.is_finite() || !yaw.is_finite() {
        return DecodeResult::Skip(SkipReason::NonFinite);
    }

    DecodeResult::Sample(OrientationSample::new(pitch, yaw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_well_formed_frame() {
        assert_eq!(
            decode_line("7,-12.5,400\r\n"),
            DecodeResult::Sample(OrientationSample::new(-12.5, 400.0))
        );
    }

    #[test]
    fn ignores_id_field_content() {
        let a = decode_line("abc,1.0,2.0");
        let b = decode_line(",1.0,2.0");
        assert_eq!(a, b);
        assert_eq!(a, DecodeResult::Sample(OrientationSample::new(1.0, 2.0)));
    }

    #[test]
    fn tolerates_spaces_around_fields() {
        assert_eq!(
            decode_line("1, 3.5 , -4"),
            DecodeResult::Sample(OrientationSample::new(3.5, -4.0))
        );
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(decode_line("1,2"), DecodeResult::Skip(SkipReason::FieldCount(2)));
        assert_eq!(decode_line("1,2,3,4"), DecodeResult::Skip(SkipReason::FieldCount(4)));
        assert_eq!(decode_line("no delimiter"), DecodeResult::Skip(SkipReason::FieldCount(1)));
    }

    #[test]
    fn rejects_truncated_and_garbage_numbers() {
        assert_eq!(decode_line("1,2.5,"), DecodeResult::Skip(SkipReason::InvalidNumber));
        assert_eq!(decode_line("1,x,3"), DecodeResult::Skip(SkipReason::InvalidNumber));
        assert_eq!(decode_line("1,2.5,3.\u{fffd}"), DecodeResult::Skip(SkipReason::InvalidNumber));
    }

    #[test]
    fn rejects_non_finite_values() {
        assert_eq!(decode_line("1,NaN,3"), DecodeResult::Skip(SkipReason::NonFinite));
        assert_eq!(decode_line("1,2,inf"), DecodeResult::Skip(SkipReason::NonFinite));
    }

    #[test]
    fn rejects_blank_lines() {
        assert_eq!(decode_line(""), DecodeResult::Skip(SkipReason::Empty));
        assert_eq!(decode_line("  \r\n"), DecodeResult::Skip(SkipReason::Empty));
    }

    #[test]
    fn decoding_is_deterministic() {
        for line in ["1,2,3", "1,,3", "garbage", "9,-0.25,17.75"] {
            assert_eq!(decode_line(line), decode_line(line));
        }
    }
}
