//! Weight category taxonomy.
//!
//! Categories form a DAG: a leaf category may roll up into more than one
//! aggregate (large-growth counts toward both "large" and "growth").  The
//! allocation tree built over them is still a strict tree; each allocation
//! node picks exactly one path through the DAG.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightType {
    All,
    Balanced,
    Bond,
    BondCorporate,
    BondForeign,
    BondGovernment,
    BondHigh,
    BondInflation,
    BondMortgage,
    BondShort,
    BondUncategorized,
    Cash,
    CashGovernment,
    CashUncategorized,
    Gold,
    RealEstate,
    Stock,
    StockDomestic,
    StockForeign,
    StockLarge,
    StockMedium,
    StockSmall,
    StockGrowth,
    StockValue,
    StockLargeGrowth,
    StockLargeValue,
    StockMediumGrowth,
    StockMediumValue,
    StockSmallGrowth,
    StockSmallValue,
}

use WeightType::*;

impl WeightType {
    /// Every category, in declaration order.
    pub const ALL_TYPES: [WeightType; 30] = [
        All,
        Balanced,
        Bond,
        BondCorporate,
        BondForeign,
        BondGovernment,
        BondHigh,
        BondInflation,
        BondMortgage,
        BondShort,
        BondUncategorized,
        Cash,
        CashGovernment,
        CashUncategorized,
        Gold,
        RealEstate,
        Stock,
        StockDomestic,
        StockForeign,
        StockLarge,
        StockMedium,
        StockSmall,
        StockGrowth,
        StockValue,
        StockLargeGrowth,
        StockLargeValue,
        StockMediumGrowth,
        StockMediumValue,
        StockSmallGrowth,
        StockSmallValue,
    ];

    /// Direct rollup targets.  `All` is the only category with none.
    pub fn parents(self) -> &'static [WeightType] {
        match self {
            All => &[],
            Balanced | Bond | Cash | Gold | RealEstate | Stock => &[All],
            BondCorporate | BondForeign | BondGovernment | BondHigh | BondInflation
            | BondMortgage | BondShort | BondUncategorized => &[Bond],
            CashGovernment | CashUncategorized => &[Cash],
            StockDomestic | StockForeign => &[Stock],
            StockLarge | StockMedium | StockSmall | StockGrowth | StockValue => {
                &[StockDomestic, StockForeign]
            }
            StockLargeGrowth => &[StockLarge, StockGrowth],
            StockLargeValue => &[StockLarge, StockValue],
            StockMediumGrowth => &[StockMedium, StockGrowth],
            StockMediumValue => &[StockMedium, StockValue],
            StockSmallGrowth => &[StockSmall, StockGrowth],
            StockSmallValue => &[StockSmall, StockValue],
        }
    }

    /// Categories that list `self` as a direct parent.
    pub fn children(self) -> Vec<WeightType> {
        Self::ALL_TYPES
            .iter()
            .copied()
            .filter(|t| t.parents().contains(&self))
            .collect()
    }

    /// True if `self` rolls up directly into `parent`.
    pub fn rolls_up_into(self, parent: WeightType) -> bool {
        self.parents().contains(&parent)
    }

    /// Length of the longest parent chain back to `All`.
    pub fn depth(self) -> usize {
        self.parents()
            .iter()
            .map(|p| p.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Largest number of direct children any category has.
    pub fn max_branching() -> usize {
        Self::ALL_TYPES
            .iter()
            .map(|t| t.children().len())
            .max()
            .unwrap_or(0)
    }

    /// Depth of the deepest category.
    pub fn max_depth() -> usize {
        Self::ALL_TYPES.iter().map(|t| t.depth()).max().unwrap_or(0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            All => "all",
            Balanced => "balanced",
            Bond => "bond",
            BondCorporate => "bond_corporate",
            BondForeign => "bond_foreign",
            BondGovernment => "bond_government",
            BondHigh => "bond_high",
            BondInflation => "bond_inflation",
            BondMortgage => "bond_mortgage",
            BondShort => "bond_short",
            BondUncategorized => "bond_uncategorized",
            Cash => "cash",
            CashGovernment => "cash_government",
            CashUncategorized => "cash_uncategorized",
            Gold => "gold",
            RealEstate => "real_estate",
            Stock => "stock",
            StockDomestic => "stock_domestic",
            StockForeign => "stock_foreign",
            StockLarge => "stock_large",
            StockMedium => "stock_medium",
            StockSmall => "stock_small",
            StockGrowth => "stock_growth",
            StockValue => "stock_value",
            StockLargeGrowth => "stock_large_growth",
            StockLargeValue => "stock_large_value",
            StockMediumGrowth => "stock_medium_growth",
            StockMediumValue => "stock_medium_value",
            StockSmallGrowth => "stock_small_growth",
            StockSmallValue => "stock_small_value",
        }
    }
}

impl fmt::Display for WeightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown weight category '{0}'")]
pub struct UnknownWeightType(pub String);

impl FromStr for WeightType {
    type Err = UnknownWeightType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL_TYPES
            .iter()
            .copied()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| UnknownWeightType(s.to_string()))
    }
}
