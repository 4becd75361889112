//! Deterministic VIN tamper rule

/// Fixed 9-character marker appended to every tampered VIN.
pub const TAMPER_MARKER: &str = "HACKED123";

/// Tamper rule: keep the first 10 characters of the input and append the
/// fixed marker. For any real 17-character VIN the result keeps the
/// manufacturer prefix but always differs from the original.
pub fn tamper_vin(vin: &str) -> String {
    let keep: String = vin.chars().take(10).collect();
    format!("{}{}", keep, TAMPER_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_prefix_and_appends_marker() {
        assert_eq!(tamper_vin("1HGCM82633A123456"), "1HGCM82633HACKED123");
    }

    #[test]
    fn always_differs_from_any_real_vin() {
        // A 17-character VIN can never equal the 19-character tampered form.
        for vin in ["1HGCM82633A123456", "WVWZZZ1JZXW000001", "JH4KA7561PC008269"] {
            assert_ne!(tamper_vin(vin), vin);
            assert_eq!(tamper_vin(vin).len(), 19);
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(tamper_vin("1HGCM82633A123456"), tamper_vin("1HGCM82633A123456"));
    }

    #[test]
    fn short_input_keeps_what_there_is() {
        assert_eq!(tamper_vin("ABC"), "ABCHACKED123");
        assert_eq!(tamper_vin(""), "HACKED123");
    }
}
