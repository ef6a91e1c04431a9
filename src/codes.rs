/// Filter categories of a saved search, in the order the claims endpoint is
/// queried for each provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    Cpt,
    Hcpcs,
    Icd,
    Drug,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 4] = [Self::Cpt, Self::Hcpcs, Self::Icd, Self::Drug];

    /// Path segment under `/api/v1/center/{npi}/`, also the key inside a
    /// saved search's `filters` mapping.
    pub fn segment(self) -> &'static str {
        match self {
            Self::Cpt => "cpt",
            Self::Hcpcs => "hcpcs",
            Self::Icd => "icd",
            Self::Drug => "drug",
        }
    }

    pub fn tag_prefix(self) -> &'static str {
        match self {
            Self::Cpt => "CPT-",
            Self::Hcpcs => "HCPCS-",
            Self::Icd => "ICD10D-",
            Self::Drug => "DRUG-",
        }
    }

    /// The drug endpoint names its list parameter differently from the code
    /// categories; the API schema requires the asymmetry.
    pub fn query_param(self) -> &'static str {
        match self {
            Self::Drug => "drug",
            _ => "code",
        }
    }
}

/// Percent-encoded JSON array literal of tagged codes, e.g.
/// `%5B%22CPT-92025%22%2C%22CPT-92071%22%5D`. Codes are embedded verbatim in
/// input order, no deduplication or validation. Callers skip empty lists
/// entirely (no request, no columns), so this is never invoked with one.
pub fn codes_query_value(codes: &[String], category: FilterCategory) -> String {
    let tag = category.tag_prefix();
    let mut value = String::from("%5B");
    for (i, code) in codes.iter().enumerate() {
        if i > 0 {
            value.push_str("%2C");
        }
        value.push_str("%22");
        value.push_str(tag);
        value.push_str(code);
        value.push_str("%22");
    }
    value.push_str("%5D");
    value
}
