use vela_core::normalize_symbol;

#[test]
fn uppercases_and_strips_separators() {
    assert_eq!(normalize_symbol("btcusdt"), "BTCUSDT");
    assert_eq!(normalize_symbol("eur/usd"), "EURUSD");
    assert_eq!(normalize_symbol(" EURUSD "), "EURUSD");
    assert_eq!(normalize_symbol("EUR/USD"), "EURUSD");
}

#[test]
fn already_canonical_symbols_pass_through() {
    assert_eq!(normalize_symbol("BTCUSDT"), "BTCUSDT");
    assert_eq!(normalize_symbol(""), "");
}
