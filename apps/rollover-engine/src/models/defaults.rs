//! Static futures defaults per root symbol.
//!
//! Loaded once at process start and exposed as a read-only lookup table.
//! Used to normalize a generic contract spec into a futures spec and to
//! drive front-month arithmetic.

use std::collections::HashMap;
use std::sync::LazyLock;

use rust_decimal::Decimal;

/// Exchange-level defaults for one futures root.
#[derive(Debug, Clone)]
pub struct ContractDefaults {
    /// Contract multiplier.
    pub multiplier: Decimal,
    /// Primary listing exchange.
    pub exchange: &'static str,
    /// True for quarterly (Mar/Jun/Sep/Dec) cycles, false for monthly.
    pub quarterly: bool,
    /// Day of the delivery month on which the front month rolls forward.
    pub roll_day: u32,
}

impl ContractDefaults {
    const fn new(multiplier: Decimal, exchange: &'static str, quarterly: bool, roll_day: u32) -> Self {
        Self {
            multiplier,
            exchange,
            quarterly,
            roll_day,
        }
    }
}

static DEFAULTS: LazyLock<HashMap<&'static str, ContractDefaults>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    // Equity index (quarterly)
    map.insert("ES", ContractDefaults::new(Decimal::from(50), "CME", true, 9));
    map.insert("NQ", ContractDefaults::new(Decimal::from(20), "CME", true, 9));
    map.insert("RTY", ContractDefaults::new(Decimal::from(50), "CME", true, 9));
    map.insert("YM", ContractDefaults::new(Decimal::from(5), "CBOT", true, 9));
    map.insert("MES", ContractDefaults::new(Decimal::from(5), "CME", true, 9));
    map.insert("MNQ", ContractDefaults::new(Decimal::from(2), "CME", true, 9));

    // Rates (quarterly)
    map.insert("ZN", ContractDefaults::new(Decimal::from(1000), "CBOT", true, 21));
    map.insert("ZB", ContractDefaults::new(Decimal::from(1000), "CBOT", true, 21));

    // Currencies (quarterly)
    map.insert("6E", ContractDefaults::new(Decimal::from(125_000), "CME", true, 9));
    map.insert("6B", ContractDefaults::new(Decimal::from(62_500), "CME", true, 9));

    // Energy (monthly)
    map.insert("CL", ContractDefaults::new(Decimal::from(1000), "NYMEX", false, 18));
    map.insert("NG", ContractDefaults::new(Decimal::from(10_000), "NYMEX", false, 28));

    // Metals (monthly)
    map.insert("GC", ContractDefaults::new(Decimal::from(100), "COMEX", false, 26));
    map.insert("SI", ContractDefaults::new(Decimal::from(5000), "COMEX", false, 25));

    map
});

/// Look up the static defaults for a futures root symbol.
///
/// The lookup is case-insensitive on the root. Returns `None` for
/// unknown roots; callers decide whether that is an error.
#[must_use]
pub fn defaults_for(root: &str) -> Option<&'static ContractDefaults> {
    DEFAULTS.get(root.to_uppercase().as_str())
}
