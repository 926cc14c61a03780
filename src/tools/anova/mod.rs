//! One-way and two-way ANOVA over [`BinLongTable`]s.
//!
//! [`BinLongTable`]: crate::data_structs::BinLongTable
mod one_way;
mod two_way;

pub use one_way::{
    one_way_anova,
    ONE_WAY_P_LABEL,
};
pub use two_way::{
    two_way_anova,
    TwoWayAnova,
    TWO_WAY_P_LABEL,
};
