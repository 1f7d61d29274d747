use crate::memory::{AddressRange, Lifespan, MemoryFlags, StaticAddress};
use std::str::FromStr;

#[test]
fn range_bounds() {
    let range = AddressRange::new(0x00400000, 0x0040ffff).unwrap();

    assert_eq!(range.min(), 0x00400000);
    assert_eq!(range.max(), 0x0040ffff);
    assert_eq!(range.length(), 0x10000);
    assert!(range.contains(0x00400000));
    assert!(range.contains(0x0040ffff));
    assert!(!range.contains(0x00410000));

    assert_eq!(AddressRange::new(0x10, 0x0f), None);
    assert_eq!(AddressRange::new(0x10, 0x10).unwrap().length(), 1);
}

#[test]
fn range_from_length() {
    let range = AddressRange::from_start_length(0x00600000, 0x80).unwrap();

    assert_eq!(range, AddressRange::new(0x00600000, 0x0060007f).unwrap());
    assert_eq!(AddressRange::from_start_length(0x1000, 0), None);
    assert_eq!(AddressRange::from_start_length(u64::MAX, 2), None);
    assert_eq!(AddressRange::new(0, u64::MAX).unwrap().length(), u64::MAX);
}

#[test]
fn range_intersection() {
    let a = AddressRange::new(0x100, 0x1ff).unwrap();
    let b = AddressRange::new(0x1ff, 0x2ff).unwrap();
    let c = AddressRange::new(0x200, 0x2ff).unwrap();

    assert!(a.intersects(&b));
    assert!(b.intersects(&a));
    assert!(!a.intersects(&c));
    assert!(b.intersects(&c));
}

#[test]
fn range_rejects_inverted_json() {
    let parsed: Result<AddressRange, _> = serde_json::from_str("[32, 16]");

    assert!(parsed.is_err());

    let parsed: AddressRange = serde_json::from_str("[16, 32]").unwrap();
    assert_eq!(parsed, AddressRange::new(16, 32).unwrap());
}

#[test]
fn lifespan_membership() {
    let open = Lifespan::now_on(3);

    assert!(!open.contains(2));
    assert!(open.contains(3));
    assert!(open.contains(i64::MAX));

    let closed = open.closed_at(7).unwrap();

    assert!(closed.contains(3));
    assert!(closed.contains(6));
    assert!(!closed.contains(7));
    assert_eq!(open.closed_at(2), None);
    assert!(open.closed_at(3).unwrap().is_empty());
}

#[test]
fn lifespan_intersection() {
    let early = Lifespan::span(0, 5).unwrap();
    let late = Lifespan::now_on(5);
    let overlapping = Lifespan::span(4, 10).unwrap();
    let empty = Lifespan::span(2, 2).unwrap();

    assert!(!early.intersects(&late));
    assert!(!late.intersects(&early));
    assert!(early.intersects(&overlapping));
    assert!(late.intersects(&overlapping));
    assert!(!empty.intersects(&early));
}

#[test]
fn lifespan_display() {
    assert_eq!(format!("{}", Lifespan::now_on(0)), "[0, +inf)");
    assert_eq!(format!("{}", Lifespan::span(1, 4).unwrap()), "[1, 4)");
}

#[test]
fn flags_parse_and_display() {
    let flags = MemoryFlags::from_str("rx").unwrap();

    assert_eq!(flags, MemoryFlags::READ | MemoryFlags::EXECUTE);
    assert_eq!(format!("{}", flags), "r-x");
    assert_eq!(MemoryFlags::from_str("r-w").unwrap(), MemoryFlags::READ | MemoryFlags::WRITE);
    assert_eq!(MemoryFlags::from_str("---").unwrap(), MemoryFlags::empty());
    assert!(MemoryFlags::from_str("rwq").is_err());

    let json = serde_json::to_string(&MemoryFlags::all()).unwrap();
    assert_eq!(json, "\"rwx\"");
    assert_eq!(serde_json::from_str::<MemoryFlags>(&json).unwrap(), MemoryFlags::all());
}

#[test]
fn static_address_text_form() {
    let addr = StaticAddress::new("ram", 0x00400000);

    assert_eq!(format!("{}", addr), "ram:00400000");
    assert_eq!(StaticAddress::from_str("ram:00400000"), Ok(addr));
    assert_eq!(
        StaticAddress::from_str("overlay:ram:0x10"),
        Ok(StaticAddress::new("overlay:ram", 0x10))
    );
    assert!(StaticAddress::from_str("00400000").is_err());
    assert!(StaticAddress::from_str(":10").is_err());
}

#[test]
fn lifespan_rejects_inverted_json() {
    assert!(serde_json::from_str::<Lifespan>(r#"{"start": 5, "end": 3}"#).is_err());

    let open: Lifespan = serde_json::from_str(r#"{"start": 2}"#).unwrap();
    assert_eq!(open, Lifespan::now_on(2));

    let empty: Lifespan = serde_json::from_str(r#"{"start": 4, "end": 4}"#).unwrap();
    assert!(empty.is_empty());

    let closed = Lifespan::span(1, 9).unwrap();
    let json = serde_json::to_string(&closed).unwrap();
    assert_eq!(serde_json::from_str::<Lifespan>(&json).unwrap(), closed);
}
