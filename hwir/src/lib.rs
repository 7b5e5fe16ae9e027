pub mod design;
pub mod printer;

pub use design::{
	Attribute, ClockSignal, Design, IrError, Location, ModuleId, ModuleImage, ModuleKind, ModuleOp, NumericConstant, Op, OpId,
	OpKind, ParamDecl, Port, Signal, Type, ValueId,
};
pub use printer::{IrPrinter, PrintError};
