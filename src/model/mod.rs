pub mod editheader;
pub mod enums;
pub mod filter_action;
pub mod rule;
pub mod select;

pub use editheader::{DeleteheaderAction, HeaderMatchSpec, ReplaceheaderAction};
pub use filter_action::{ActionKind, FilterAction};
pub use filter_test::{FilterTest, FilterTests, TestKind};
pub use rule::{FilterRule, FilterRuleNode};
pub use select::TestOracle;
