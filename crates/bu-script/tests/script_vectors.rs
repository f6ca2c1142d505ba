//! Script test vectors in the `[scriptSig, scriptPubKey, flags, error]`
//! format, verified without a transaction.

use bu_script::interpreter::{verify_script, NullChecker, ScriptErrorCode, ScriptFlags, MAX_OPS_PER_SCRIPT};
use bu_script::parse_script;

const VECTORS: &str = include_str!("data/script_tests.json");

#[test]
fn test_script_vectors() {
    let vectors: Vec<Vec<String>> = serde_json::from_str(VECTORS).expect("vectors parse");
    let mut checked = 0;

    for vector in vectors.iter().filter(|v| v.len() >= 4) {
        let script_sig = parse_script(&vector[0]).expect("scriptSig parses");
        let script_pub_key = parse_script(&vector[1]).expect("scriptPubKey parses");
        let flags = ScriptFlags::parse(&vector[2]).expect("flags parse");
        let expected = ScriptErrorCode::from_name(&vector[3]).expect("known error name");

        let result = verify_script(&script_sig, &script_pub_key, flags, MAX_OPS_PER_SCRIPT, &NullChecker);
        let actual = match result {
            Ok(()) => ScriptErrorCode::Ok,
            Err(e) => e.code,
        };
        assert_eq!(actual, expected, "vector {:?}", vector);
        checked += 1;
    }

    assert!(checked > 80);
}
