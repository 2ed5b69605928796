#[cfg(test)]
mod xmss_tests {
    use xmss_state::crypto::hash::HashAlgorithm;
    use xmss_state::keystate::{self, MemoryStateStore};
    use xmss_state::xmss::{MerkleTree, ParameterSet, TreeLocation, XMSSKeypair, XMSSParams, XMSSSignature};
    use xmss_state::XmssError;

    const SEED: [u8; 32] = [
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b, 0x1c, 0x1d,
        0x1e, 0x1f,
    ];

    fn params(height: u32) -> XMSSParams {
        XMSSParams::new(height, 16, HashAlgorithm::Sha256).unwrap()
    }

    #[test]
    fn test_four_leaf_tree_scenario() {
        let mut keypair = XMSSKeypair::generate_from_seed(&params(2), &SEED).unwrap();
        let public_key = keypair.public_key().clone();

        let messages: [&[u8]; 4] = [b"a", b"b", b"c", b"d"];
        let signatures: Vec<XMSSSignature> =
            messages.iter().map(|m| keypair.sign(m).unwrap()).collect();

        for (i, (message, signature)) in messages.iter().zip(&signatures).enumerate() {
            assert_eq!(signature.leaf_index(), i as u32);
            assert!(public_key.verify(message, signature));
        }

        assert!(matches!(keypair.sign(b"e"), Err(XmssError::KeyExhausted { index: 4, capacity: 4 })));
        assert!(!public_key.verify(b"x", &signatures[0]));
    }

    #[test]
    fn test_xmss_sign_and_verify_single_message() {
        let mut keypair = XMSSKeypair::generate(&params(4)).unwrap();
        let message = b"Hello, XMSS!";

        let signature = keypair.sign(message).unwrap();
        assert!(keypair.public_key().verify(message, &signature));

        assert_eq!(keypair.private_key().index(), 1);
    }

    #[test]
    fn test_xmss_sign_multiple_messages() {
        let p = params(3);
        let mut keypair = XMSSKeypair::generate(&p).unwrap();

        for i in 0..p.capacity() {
            let message = format!("Message {}", i);
            let signature = keypair.sign(message.as_bytes()).unwrap();
            assert!(keypair.public_key().verify(message.as_bytes(), &signature));
            assert_eq!(keypair.private_key().index(), i + 1);
        }
        assert!(keypair.is_exhausted());
    }

    #[test]
    fn test_signature_does_not_transfer_between_messages() {
        let mut keypair = XMSSKeypair::generate_from_seed(&params(2), &SEED).unwrap();
        let signature = keypair.sign(b"first message").unwrap();
        assert!(!keypair.public_key().verify(b"second message", &signature));
    }

    #[test]
    fn test_signature_does_not_verify_under_other_key() {
        let mut keypair = XMSSKeypair::generate_from_seed(&params(2), &SEED).unwrap();
        let other = XMSSKeypair::generate_from_seed(&params(2), &[0xee; 32]).unwrap();
        let signature = keypair.sign(b"message").unwrap();
        assert!(!other.public_key().verify(b"message", &signature));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let p = params(3);
        let mut keypair = XMSSKeypair::generate_from_seed(&p, &SEED).unwrap();
        let bytes = keypair.sign(b"payload").unwrap().to_bytes();

        for position in [0, 5, 40, bytes.len() - 1] {
            let mut tampered = bytes.clone();
            tampered[position] ^= 0x01;
            match XMSSSignature::from_bytes(&tampered, &p) {
                Ok(signature) => assert!(!keypair.public_key().verify(b"payload", &signature)),
                Err(err) => assert!(matches!(err, XmssError::MalformedInput(_))),
            }
        }
    }

    #[test]
    fn test_xmss_signature_serialization() {
        let p = params(4);
        let mut keypair = XMSSKeypair::generate(&p).unwrap();
        let message = b"Test message";

        let signature = keypair.sign(message).unwrap();
        let serialized = signature.to_bytes();
        assert_eq!(serialized.len(), p.signature_size());

        let deserialized = XMSSSignature::from_bytes(&serialized, &p).unwrap();
        assert_eq!(deserialized, signature);
        assert!(keypair.public_key().verify(message, &deserialized));

        assert!(XMSSSignature::from_bytes(&serialized[1..], &p).is_err());
    }

    #[test]
    fn test_xmss_with_different_tree_heights() {
        for h in [1, 2, 3, 5] {
            let mut keypair = XMSSKeypair::generate(&params(h)).unwrap();
            let message = format!("Test with height {}", h);

            let signature = keypair.sign(message.as_bytes()).unwrap();
            assert_eq!(signature.auth_path().len(), h as usize);
            assert!(keypair.public_key().verify(message.as_bytes(), &signature));
        }
    }

    #[test]
    fn test_xmss_with_other_parameter_choices() {
        for (w, hash) in [(4, HashAlgorithm::Sha256), (256, HashAlgorithm::Sha3_256)] {
            let p = XMSSParams::new(2, w, hash).unwrap();
            let mut keypair = XMSSKeypair::generate_from_seed(&p, &SEED).unwrap();
            let signature = keypair.sign(b"parameters").unwrap();
            assert_eq!(signature.wots_signature().chains().len(), p.wots().chains());
            assert!(keypair.public_key().verify(b"parameters", &signature));
        }
    }

    #[test]
    fn test_xmss_deterministic_key_generation() {
        let keypair1 = XMSSKeypair::generate_from_seed(&params(3), &SEED).unwrap();
        let keypair2 = XMSSKeypair::generate_from_seed(&params(3), &SEED).unwrap();

        assert_eq!(keypair1.public_key().root(), keypair2.public_key().root());
        assert_eq!(keypair1.public_key().public_seed(), keypair2.public_key().public_seed());

        let tree = MerkleTree::build_layer(
            keypair1.params().wots(),
            &SEED,
            keypair1.public_key().public_seed(),
            TreeLocation::default(),
            3,
        )
        .unwrap();
        assert_eq!(tree.root(), keypair1.public_key().root());
    }

    #[test]
    fn test_xmss_state_persistence() {
        let p = params(3);
        let mut keypair = XMSSKeypair::generate(&p).unwrap();

        keypair.sign(b"Message 1").unwrap();
        keypair.sign(b"Message 2").unwrap();

        let exported = keystate::export_private(keypair.private_key());
        let state = keystate::import_private(&exported, &p).unwrap();
        let mut restored_keypair = XMSSKeypair::restore(&p, state, None).unwrap();

        assert_eq!(restored_keypair.private_key().index(), 2);
        assert_eq!(restored_keypair.public_key(), keypair.public_key());

        let signature = restored_keypair.sign(b"Message 3").unwrap();
        assert_eq!(signature.leaf_index(), 2);
        assert!(restored_keypair.public_key().verify(b"Message 3", &signature));
    }

    #[test]
    fn test_second_signer_only_from_exported_bytes() {
        let p = params(2);
        let mut keypair = XMSSKeypair::generate_from_seed(&p, &SEED).unwrap();
        let snapshot = keystate::export_private(keypair.private_key());

        let signature = keypair.sign(b"pay alice").unwrap();
        assert_eq!(signature.leaf_index(), 0);

        let live_index = keypair.private_key().index();
        assert!(matches!(
            keystate::import_private_guarded(&snapshot, &p, live_index),
            Err(XmssError::InvalidState(_))
        ));

        let current = keystate::export_private(keypair.private_key());
        let state = keystate::import_private_guarded(&current, &p, live_index).unwrap();
        let mut successor = XMSSKeypair::restore(&p, state, Some(keypair.public_key().state())).unwrap();
        assert_eq!(successor.sign(b"pay bob").unwrap().leaf_index(), 1);
    }

    #[test]
    fn test_persisted_state_never_reuses_an_index() {
        let p = params(2);
        let mut keypair = XMSSKeypair::generate_from_seed(&p, &SEED).unwrap();
        let mut store = MemoryStateStore::new();

        let first = keypair.sign_with_store(b"one", &mut store).unwrap();
        drop(keypair);

        // simulated restart from the durable copy
        let state = keystate::import_private_guarded(store.latest().unwrap(), &p, 1).unwrap();
        let mut restarted = XMSSKeypair::restore(&p, state, None).unwrap();
        let second = restarted.sign_with_store(b"two", &mut store).unwrap();

        assert_ne!(first.leaf_index(), second.leaf_index());
        assert_eq!(store.writes(), 2);
    }
}
