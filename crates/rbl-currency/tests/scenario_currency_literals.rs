use rbl_currency::{Currency, ParseCurrencyError};

#[test]
fn scenario_account_literals_parse_to_exact_cents() {
    let cases = [
        ("100", 10_000),
        ("100.01", 10_001),
        ("$1,250.5", 125_050),
        ("-0.05", -5),
        (".75", 75),
    ];
    for (input, cents) in cases {
        assert_eq!(input.parse::<Currency>(), Ok(Currency::from_cents(cents)), "{input}");
    }
}

#[test]
fn scenario_display_is_parseable() {
    for cents in [0, 1, -1, 99, -99, 10_001, -123_456_789] {
        let c = Currency::from_cents(cents);
        assert_eq!(c.to_string().parse::<Currency>(), Ok(c));
    }
}

#[test]
fn scenario_sub_cent_literals_are_refused() {
    assert!(matches!(
        "1.005".parse::<Currency>(),
        Err(ParseCurrencyError::TooPrecise { .. })
    ));
    assert_eq!("".parse::<Currency>(), Err(ParseCurrencyError::Empty));
    assert!(matches!(
        "12abc".parse::<Currency>(),
        Err(ParseCurrencyError::InvalidDigit { .. })
    ));
}

#[test]
fn scenario_lot_arithmetic() {
    let price = Currency::from_cents(4_000);
    let cash = Currency::from_cents(12_345);
    let lots = cash.checked_lots(price).unwrap();
    assert_eq!(lots, 3);
    assert_eq!(price.checked_mul(lots), Some(Currency::from_cents(12_000)));
    assert_eq!(cash.checked_lots(Currency::ZERO), None);
}
