mod calculator;
mod drafter;
mod factorial;
mod retriever;
mod time;
mod wheel;

pub use calculator::{arithmetic_tools, format_number, ArithmeticOp, ArithmeticTool};
pub use drafter::{DocumentBuffer, SaveTool, UpdateTool};
pub use factorial::FactorialTool;
pub use retriever::RetrieverTool;
pub use time::CurrentTimeTool;
pub use wheel::{FortunateWheelTool, WHEEL_OUTCOMES};
