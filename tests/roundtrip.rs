//! Whole-format round-trip laws, driven through the public API only.

use fudge_wire::{
    decode_envelope, encode_envelope, type_id, DecodeEvent, Decoder, Envelope, Field, MapResolver,
    Message, Taxonomy, TypeRegistry, Value,
};

use rand::{Rng, SeedableRng};

fn roundtrip(env: &Envelope) -> Envelope {
    let reg = TypeRegistry::global();
    let enc = encode_envelope(env, reg, None).unwrap();
    decode_envelope(&enc, reg, None).unwrap()
}

#[test]
fn every_value_kind_roundtrips() {
    let mut inner = Message::new();
    inner.add_by_name("deep", -1i64);

    let mut msg = Message::new();
    msg.add(Value::Indicator);
    msg.add_by_name("bool", true);
    msg.add_by_name("byte", -5i8);
    msg.add_by_name("short", -300i16);
    msg.add_by_name("int", 1_000_000i32);
    msg.add_by_name("long", -9_000_000_000i64);
    msg.add_by_name("float", 1.5f32);
    msg.add_by_name("double", std::f64::consts::PI);
    msg.add_by_name("bytes", vec![0u8, 255, 128]);
    msg.add_by_name("shorts", vec![-1i16, 0, 1]);
    msg.add_by_name("ints", vec![i32::MIN, 0, i32::MAX]);
    msg.add_by_name("longs", vec![i64::MIN, i64::MAX]);
    msg.add_by_name("floats", vec![0.0f32, -0.0, f32::INFINITY]);
    msg.add_by_name("doubles", vec![f64::NAN]);
    msg.add_by_name("str", "héllo \0 world \u{1d11e}");
    msg.add_by_name("sub", inner);

    let env = Envelope::new(msg);
    let back = roundtrip(&env);

    // NaN breaks PartialEq, so compare that field by bits and the rest
    // structurally.
    for (a, b) in env.message.iter().zip(back.message.iter()) {
        assert_eq!(a.name(), b.name());
        assert_eq!(a.ordinal(), b.ordinal());
        assert_eq!(a.type_id(), b.type_id());
        match (a.value(), b.value()) {
            (Value::F64Array(x), Value::F64Array(y)) => {
                assert_eq!(x.len(), y.len());
                for (ex, ey) in x.iter().zip(y) {
                    assert_eq!(ex.to_bits(), ey.to_bits());
                }
            }
            (x, y) => assert_eq!(x, y),
        }
    }
}

#[test]
fn repeated_names_and_ordinals_keep_order() {
    let mut msg = Message::new();
    msg.add_by_name("x", 1i32);
    msg.add_by_name("x", 2i32);
    msg.add_by_ordinal(1, 3i32);
    msg.add_by_ordinal(1, 4i32);
    msg.add_full("x", 1, 5i32);
    let back = roundtrip(&Envelope::new(msg.clone()));
    assert_eq!(back.message, msg);
}

#[test]
fn size_width_boundaries() {
    // 100, 1 000, and 100 000 byte payloads exercise the 1-, 2-, and 4-byte
    // explicit size widths.
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    let mut msg = Message::new();
    for len in [100usize, 1_000, 100_000] {
        let mut bytes = vec![0u8; len];
        rng.fill(&mut bytes[..]);
        msg.add_by_name(format!("b{}", len), bytes);
    }
    let env = Envelope::new(msg);
    let back = roundtrip(&env);
    for len in [100usize, 1_000, 100_000] {
        let field = back.message.field_by_name(&format!("b{}", len)).unwrap();
        let got = field.value().as_bytes().unwrap();
        let want = env
            .message
            .field_by_name(&format!("b{}", len))
            .unwrap()
            .value()
            .as_bytes()
            .unwrap();
        assert_eq!(got.len(), len);
        assert_eq!(got, want);
    }
}

#[test]
fn fixed_length_byte_array_selection() {
    let mut msg = Message::new();
    msg.add_by_name("twenty", vec![7u8; 20]);
    msg.add_by_name("twentyone", vec![7u8; 21]);
    let env = Envelope::new(msg);
    assert_eq!(
        env.message.fields()[0].type_id(),
        type_id::BYTE_ARRAY_20
    );
    assert_eq!(env.message.fields()[1].type_id(), type_id::BYTE_ARRAY);
    let back = roundtrip(&env);
    assert_eq!(back.message.fields()[0].type_id(), type_id::BYTE_ARRAY_20);
    assert_eq!(back.message.fields()[1].type_id(), type_id::BYTE_ARRAY);
    assert_eq!(back, env);
}

#[test]
fn taxonomy_elision_recovers_names() {
    let tax = Taxonomy::from_pairs([(1, "id"), (2, "price")]);
    let mut resolver = MapResolver::new();
    resolver.insert(42, tax.clone());

    let mut msg = Message::new();
    msg.add_full("id", 1, 77i32);
    msg.add_full("price", 2, 1.25f64);
    let env = Envelope::with_taxonomy(msg, 42);

    let reg = TypeRegistry::global();
    let with_tax = encode_envelope(&env, reg, Some(&tax)).unwrap();
    let without = encode_envelope(&env, reg, None).unwrap();
    assert!(with_tax.len() < without.len());

    let back = decode_envelope(&with_tax, reg, Some(&resolver)).unwrap();
    assert_eq!(back, env);
}

#[test]
fn unknown_type_passthrough_is_byte_exact() {
    let reg = TypeRegistry::global();
    // Hand-built envelope: one variable-width field of unregistered type 201
    // with 4 payload bytes.
    let enc = vec![
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0f, 0x20, 0xc9, 0x04, 0xde, 0xad, 0xbe, 0xef,
    ];
    let env = decode_envelope(&enc, reg, None).unwrap();
    let field = &env.message.fields()[0];
    assert_eq!(field.type_id(), 201);
    assert_eq!(
        field.value(),
        &Value::Unknown {
            type_id: 201,
            bytes: vec![0xde, 0xad, 0xbe, 0xef],
        }
    );
    let back = encode_envelope(&env, reg, None).unwrap();
    assert_eq!(back, enc);
}

#[test]
fn frame_accounting_matches_declared_sizes() {
    // Three levels of nesting. A clean finish() proves every frame's
    // consumed bytes landed exactly on its declared size; the event counts
    // prove each start met its matching end.
    let mut level2 = Message::new();
    level2.add_by_name("leaf", vec![1u8; 100]);
    let mut level1 = Message::new();
    level1.add_by_name("mid", level2);
    level1.add_by_ordinal(9, 1i32);
    let mut root = Message::new();
    root.add_by_name("top", level1);

    let reg = TypeRegistry::global();
    let enc = encode_envelope(&Envelope::new(root), reg, None).unwrap();

    let mut dec = Decoder::new(&enc, reg);
    let mut starts = 0u32;
    let mut ends = 0u32;
    while dec.has_next() {
        match dec.next().unwrap() {
            DecodeEvent::SubMessageStart { .. } => starts += 1,
            DecodeEvent::SubMessageEnd => ends += 1,
            _ => {}
        }
    }
    dec.finish().unwrap();
    assert_eq!(starts, 2);
    assert_eq!(ends, 2);
}

#[test]
fn randomized_message_trees_roundtrip() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0x00d5eed);
    for _ in 0..50 {
        let msg = random_message(&mut rng, 3);
        let env = Envelope::new(msg);
        assert_eq!(roundtrip(&env), env);
    }
}

fn random_message(rng: &mut impl Rng, depth: u8) -> Message {
    let mut msg = Message::new();
    let fields = rng.gen_range(0..8);
    for _ in 0..fields {
        let name = if rng.gen_bool(0.5) {
            Some(format!("f{}", rng.gen_range(0..5)))
        } else {
            None
        };
        let ordinal = if rng.gen_bool(0.5) {
            Some(rng.gen_range(-10i16..10))
        } else {
            None
        };
        let value: Value = match rng.gen_range(0..8) {
            0 => Value::Bool(rng.gen()),
            1 => Value::I32(rng.gen()),
            2 => Value::I64(rng.gen()),
            3 => Value::F64(rng.gen_range(-1.0e9..1.0e9)),
            4 => Value::Str(format!("s{}", rng.gen_range(0..1000))),
            5 => {
                let len = rng.gen_range(0..64);
                let mut bytes = vec![0u8; len];
                rng.fill(&mut bytes[..]);
                Value::Bytes(bytes)
            }
            6 => Value::I32Array((0..rng.gen_range(0..10)).map(|_| rng.gen()).collect()),
            _ if depth > 0 => Value::Message(random_message(rng, depth - 1)),
            _ => Value::I16(rng.gen()),
        };
        msg.push(Field::new(name, ordinal, value));
    }
    msg
}
