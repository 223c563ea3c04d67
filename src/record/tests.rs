use super::*;

//-----------------------------------------------------------------------------

fn parse_query(variant: &str) -> VariantQuery {
    let query = VariantQuery::parse(variant);
    assert!(query.is_ok(), "Failed to parse variant {}: {}", variant, query.unwrap_err());
    query.unwrap()
}

fn parse_selector(selector: &str) -> FieldSelector {
    let result = selector.parse::<FieldSelector>();
    assert!(result.is_ok(), "Failed to parse field selector {}: {}", selector, result.unwrap_err());
    result.unwrap()
}

//-----------------------------------------------------------------------------

#[test]
fn chrom_normalization() {
    assert_eq!(normalize_chrom("chr21"), "21", "Prefix was not stripped");
    assert_eq!(normalize_chrom("21"), "21", "Unprefixed name was changed");
    assert_eq!(normalize_chrom("chrX"), "X", "Prefix was not stripped");
    assert_eq!(normalize_chrom("MT"), "MT", "Unprefixed name was changed");
    assert_eq!(normalize_chrom("1chr"), "1chr", "Only a prefix should be stripped");
    assert_eq!(normalize_chrom("chrchr1"), "chr1", "Only one prefix should be stripped");

    let mut key = VariantKey {
        chrom: String::from("chr1"),
        pos: 100,
        reference: String::from("A"),
        alternate: String::from("G"),
    };
    key.normalize();
    assert_eq!(key.chrom, "1", "Key was not normalized in place");
    assert_eq!(VariantKey::new("chr1", 100, "A", "G"), key, "Constructor did not normalize the key");
}

#[test]
fn allele_validation() {
    for allele in ["A", "C", "G", "T", "ACGT", "TTTTTTTTTTTTTTTTTTTTTTTTTTTTTT"] {
        assert!(is_valid_allele(allele), "Allele {} should be valid", allele);
    }
    for allele in ["", "N", "a", "ACGN", "<DEL>", "A,T", "*", "AC GT"] {
        assert!(!is_valid_allele(allele), "Allele {} should be invalid", allele);
    }
    assert!(VariantKey::new("1", 1, "AC", "A").has_valid_alleles(), "Deletion should be valid");
    assert!(!VariantKey::new("1", 1, "A", "N").has_valid_alleles(), "Alternate N should be invalid");
    assert!(!VariantKey::new("1", 1, "N", "A").has_valid_alleles(), "Reference N should be invalid");
}

//-----------------------------------------------------------------------------

#[test]
fn frequency_fields() {
    assert_eq!(FrequencyField::ALL.len(), FrequencyField::COUNT, "Wrong number of fields");
    for (i, field) in FrequencyField::ALL.iter().enumerate() {
        assert_eq!(field.index(), i, "Wrong index for field {}", field);
        assert_eq!(FrequencyField::from_name(field.name()), Some(*field), "Name does not round-trip for {}", field);
    }
    assert_eq!(FrequencyField::AfPopmax.to_string(), "AF_popmax", "Wrong display name");
    assert!(FrequencyField::from_name("af").is_none(), "Field names should be case-sensitive");
    assert!(FrequencyField::from_name("chrom").is_none(), "Key columns are not frequency fields");
}

#[test]
fn frequencies() {
    let mut frequencies = Frequencies::missing();
    assert!(frequencies.is_missing(), "New frequencies should be missing");
    frequencies.set(FrequencyField::AfNfe, Some(0.25));
    assert!(!frequencies.is_missing(), "Frequencies with a value should not be missing");
    assert_eq!(frequencies.get(FrequencyField::AfNfe), Some(0.25), "Wrong AF_nfe");
    assert_eq!(frequencies.get(FrequencyField::Af), None, "AF should be missing");
    assert_eq!(frequencies.values()[4], Some(0.25), "Wrong value in column order");
}

//-----------------------------------------------------------------------------

#[test]
fn field_selectors() {
    assert_eq!(parse_selector("*"), FieldSelector::All, "Wrong selector for *");
    assert_eq!(parse_selector(" * "), FieldSelector::All, "Whitespace should be ignored");
    assert_eq!(parse_selector("AF"), FieldSelector::from(FrequencyField::Af), "Wrong selector for AF");
    assert_eq!(
        parse_selector("AF_popmax,AF, AF_eas"),
        FieldSelector::Fields(vec![FrequencyField::AfPopmax, FrequencyField::Af, FrequencyField::AfEas]),
        "Field order should follow the selector"
    );
    assert_eq!(FieldSelector::All.fields(), FrequencyField::ALL.to_vec(), "All should select every field");
    assert_eq!(FieldSelector::default(), FieldSelector::from(FrequencyField::Af), "Default should select AF");

    for invalid in ["", "AF,", "chrom", "AF, pos", "tt.chrom", "AF; DROP TABLE gnomad_db", "af"] {
        let result = invalid.parse::<FieldSelector>();
        assert!(matches!(result, Err(Error::Parse(_))), "Selector '{}' should fail with a parse error", invalid);
    }
}

//-----------------------------------------------------------------------------

#[test]
fn variant_queries() {
    let query = parse_query("21:9825790:C>T");
    assert_eq!(query.key(), &VariantKey::new("21", 9825790, "C", "T"), "Wrong key");
    assert_eq!(parse_query("chr21:9825790:C>T"), query, "Prefix was not stripped");
    assert_eq!(query.to_string(), "21:9825790:C>T", "Wrong string representation");

    let indel = parse_query("X:100:ACG>A");
    assert_eq!(indel.key().reference, "ACG", "Wrong reference allele");
    assert_eq!(indel.key().alternate, "A", "Wrong alternate allele");

    // Alleles are not validated in queries; they just will not match anything.
    let symbolic = parse_query("1:100:A>N");
    assert_eq!(symbolic.key().alternate, "N", "Wrong alternate allele");

    let from_key = VariantQuery::from(VariantKey::new("chr2", 5, "G", "C"));
    assert_eq!(from_key.key().chrom, "2", "Query from key was not normalized");

    // A name with a repeated prefix loses exactly one prefix, wherever the query comes from.
    let repeated = parse_query("chrchr2:5:G>C");
    assert_eq!(repeated.key().chrom, "chr2", "Only one prefix should be stripped");
    assert_eq!(VariantQuery::new("chrchr2", 5, "G", "C"), repeated, "Constructed and parsed queries differ");
    assert_eq!(VariantQuery::from(VariantKey::new("chrchr2", 5, "G", "C")), repeated, "Query from key was normalized twice");
}

#[test]
fn invalid_variant_queries() {
    let invalid = [
        "", "21", "21:9825790", "21:9825790:C", "21:9825790:C>", "21:9825790:>T",
        "21:9825790:C>T>G", "21:9825790:C:T", "21:pos:C>T", "21:-5:C>T", ":9825790:C>T", "chr:1:A>C",
    ];
    for variant in invalid {
        let result = VariantQuery::parse(variant);
        assert!(matches!(result, Err(Error::Parse(_))), "Variant '{}' should fail with a parse error", variant);
    }
}

//-----------------------------------------------------------------------------

#[test]
fn intervals() {
    let interval = Interval::new("chr21", 9825780, 9825799);
    assert_eq!(interval.chrom(), "21", "Interval chromosome was not normalized");
    assert_eq!((interval.start(), interval.end()), (9825780, 9825799), "Wrong interval bounds");
    assert_eq!(Interval::new("chrchr1", 1, 2).chrom(), "chr1", "Only one prefix should be stripped");
    assert!(!interval.is_empty(), "Interval should not be empty");
    assert!(interval.contains(&VariantKey::new("21", 9825780, "A", "C")), "Start should be included");
    assert!(interval.contains(&VariantKey::new("21", 9825799, "A", "C")), "End should be included");
    assert!(!interval.contains(&VariantKey::new("21", 9825800, "A", "C")), "Position after end included");
    assert!(!interval.contains(&VariantKey::new("22", 9825790, "A", "C")), "Other chromosome included");
    assert!(Interval::new("1", 10, 9).is_empty(), "Reversed interval should be empty");

    let parsed = Interval::parse("chr21:9825780-9825799");
    assert!(parsed.is_ok(), "Failed to parse interval: {}", parsed.unwrap_err());
    assert_eq!(parsed.unwrap(), interval, "Wrong parsed interval");
    assert_eq!(interval.to_string(), "21:9825780-9825799", "Wrong string representation");

    for invalid in ["21", "21:100", "21:a-b", "21:100-", "21:-100"] {
        assert!(Interval::parse(invalid).is_err(), "Interval '{}' should not parse", invalid);
    }
}

//-----------------------------------------------------------------------------
