use crate::shape::ShapeKind;

/// 界面发往采集线程的会话命令
/// 在处理下一条样本之前统一生效，三者都会把试次流程重置到起点
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    SelectShape(ShapeKind),
    ToggleDirection,
    ResetCursor,
}
