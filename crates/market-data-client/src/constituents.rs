//! Static index membership tables.

pub const NIFTY50: &[&str] = &[
    "RELIANCE", "TCS", "HDFCBANK", "INFY", "ICICIBANK", "KOTAKBANK", "HINDUNILVR",
    "LT", "SBIN", "BHARTIARTL", "ITC", "ASIANPAINT", "AXISBANK", "MARUTI", "BAJFINANCE",
    "HCLTECH", "WIPRO", "ULTRACEMCO", "NESTLEIND", "DMART", "BAJAJFINSV", "TITAN",
    "ADANIPORTS", "ONGC", "NTPC", "POWERGRID", "M&M", "TECHM", "SUNPHARMA", "TATAMOTORS",
    "COALINDIA", "INDUSINDBK", "GRASIM", "CIPLA", "EICHERMOT", "HEROMOTOCO", "DRREDDY",
    "JSWSTEEL", "BRITANNIA", "APOLLOHOSP", "DIVISLAB", "BPCL", "TATACONSUM", "HINDALCO",
    "BAJAJ-AUTO", "SHREECEM", "UPL", "TATASTEEL", "ADANIENT", "SBILIFE",
];

pub const BANKNIFTY: &[&str] = &[
    "HDFCBANK", "ICICIBANK", "KOTAKBANK", "SBIN", "AXISBANK", "INDUSINDBK",
    "BANDHANBNK", "FEDERALBNK", "IDFCFIRSTB", "PNB", "AUBANK", "RBLBANK",
];

/// Unknown index names fall back to the ten largest Nifty 50 members.
const DEFAULT_COUNT: usize = 10;

pub fn index_constituents(index_name: &str) -> Vec<String> {
    let members: &[&str] = match index_name.trim().to_uppercase().as_str() {
        "NIFTY50" => NIFTY50,
        "BANKNIFTY" => BANKNIFTY,
        _ => &NIFTY50[..DEFAULT_COUNT],
    };

    members.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nifty50_has_fifty_members() {
        assert_eq!(index_constituents("Nifty50").len(), 50);
        assert_eq!(index_constituents("nifty50")[0], "RELIANCE");
    }

    #[test]
    fn test_banknifty() {
        let members = index_constituents("BankNifty");
        assert_eq!(members.len(), 12);
        assert!(members.contains(&"PNB".to_string()));
    }

    #[test]
    fn test_unknown_index_defaults_to_top_ten() {
        let members = index_constituents("Midcap150");
        assert_eq!(members.len(), 10);
        assert_eq!(members.last().map(String::as_str), Some("BHARTIARTL"));
    }
}
