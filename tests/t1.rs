use anyhow::Result;
use ednread::read::{read_all, write_all};

const INPUT: &[u8] = include_bytes!("t-input.edn");
const EXPECTED: &[u8] = include_bytes!("t-expected.edn");

#[test]
fn t1() -> Result<()> {
    let vals = read_all(INPUT)?;
    let mut out = Vec::<u8>::new();
    write_all(&mut out, &vals)?;
    assert_eq!(String::from_utf8(out)?, std::str::from_utf8(EXPECTED)?);
    Ok(())
}

#[test]
fn t1_reads_back() -> Result<()> {
    let vals = read_all(INPUT)?;
    let mut out = Vec::<u8>::new();
    write_all(&mut out, &vals)?;
    let vals2 = read_all(&*out)?;
    // ##NaN included, OrderedFloat considers NaNs equal
    assert_eq!(vals, vals2);
    Ok(())
}
