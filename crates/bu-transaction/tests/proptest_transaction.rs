use proptest::prelude::*;

use bu_script::interpreter::{ScriptFlags, SigHashType};
use bu_script::Script;
use bu_transaction::sighash::signature_hash;
use bu_transaction::{Transaction, TransactionInput, TransactionOutput};

/// Strategy to generate a random transaction.
fn arb_transaction() -> impl Strategy<Value = Transaction> {
    let arb_input = (
        prop::array::uniform32(any::<u8>()),       // prev tx hash
        any::<u32>(),                              // prev tx index
        prop::collection::vec(any::<u8>(), 0..64), // script bytes
        any::<u32>(),                              // sequence
    )
        .prop_map(|(hash, idx, script_bytes, seq)| {
            let mut input = TransactionInput::spending(hash, idx);
            input.script_sig = Script::from_bytes(&script_bytes);
            input.sequence_number = seq;
            input
        });

    let arb_output = (any::<i64>(), prop::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(satoshis, script_bytes)| {
            TransactionOutput::paying(satoshis, Script::from_bytes(&script_bytes))
        });

    (
        any::<i32>(), // version
        prop::collection::vec(arb_input, 1..4),
        prop::collection::vec(arb_output, 1..4),
        any::<u32>(), // locktime
    )
        .prop_map(|(version, inputs, outputs, lock_time)| {
            let mut tx = Transaction::new();
            tx.version = version;
            tx.lock_time = lock_time;
            for i in inputs {
                tx.add_input(i);
            }
            for o in outputs {
                tx.add_output(o);
            }
            tx
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transaction_serialize_deserialize_roundtrip(tx in arb_transaction()) {
        let bytes = tx.to_bytes();
        let tx2 = Transaction::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&tx, &tx2);
        prop_assert_eq!(tx.tx_id(), tx2.tx_id());
    }

    #[test]
    fn sighash_ignores_script_sigs(tx in arb_transaction(), hash_type in any::<u8>(), amount in any::<i64>()) {
        let code = Script::from_bytes(&[0x76, 0xa9, 0x88, 0xac]);
        let sighash_type = SigHashType::new(u32::from(hash_type));
        let mut stripped = tx.clone();
        for input in &mut stripped.inputs {
            input.script_sig = Script::new();
        }
        for flags in [ScriptFlags::NONE, ScriptFlags::SIGHASH_FORKID] {
            prop_assert_eq!(
                signature_hash(&code, &tx, 0, sighash_type, amount, flags),
                signature_hash(&code, &stripped, 0, sighash_type, amount, flags)
            );
        }
    }

    #[test]
    fn forkid_sighash_commits_to_amount(tx in arb_transaction(), amount in 0i64..1_000_000) {
        let code = Script::from_bytes(&[0xac]);
        let sighash_type = SigHashType::all_forkid();
        let flags = ScriptFlags::SIGHASH_FORKID;
        prop_assert_ne!(
            signature_hash(&code, &tx, 0, sighash_type, amount, flags),
            signature_hash(&code, &tx, 0, sighash_type, amount + 1, flags)
        );
    }
}
