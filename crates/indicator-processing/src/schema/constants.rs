//! Built-in filter constants and field tables for the registered sources.

/// Default header keyword for World Bank style exports.
pub const DEFAULT_HEADER_KEYWORD: &str = "Country Name";

/// Header keyword for the generic long transform of arbitrary tables.
pub const GENERIC_HEADER_KEYWORD: &str = "Country";

/// Default number of leading lines scanned for the header keyword.
pub const DEFAULT_MAX_SCAN_LINES: usize = 20;

/// First year (inclusive) of the default universe.
pub const EARLIEST_INCLUDED_YEAR: i32 = 2014;

/// Last year (inclusive) of the default universe.
pub const LATEST_INCLUDED_YEAR: i32 = 2025;

/// Default country allow-list. Membership overlaps between groups; the
/// filter stores a set.
pub const INCLUDED_COUNTRY_CODES: &[&str] = &[
    // Central Africa
    "CAF", "TCD", "CMR", "COG", "COD", "GAB", "GNQ",
    // South and East Asian focus countries
    "IND", "CHN", "PHL", "PAK",
    // G20
    "ARG", "AUS", "BRA", "CAN", "CHN", "FRA", "DEU", "IND", "IDN", "ITA", "JPN", "KOR", "MEX",
    "RUS", "SAU", "ZAF", "TUR", "GBR", "USA", "EUU",
];

/// WHO treatment-outcome field codes mapped to descriptive indicator names.
///
/// Order is significant: unpivoted rows follow it. `c_ret_tsr` appears once,
/// in its first position, carrying the non-relapse name.
pub const TB_TREATMENT_OUTCOME_FIELDS: &[(&str, &str)] = &[
    // New cases (all forms)
    ("new_sp_coh", "new_tb_cases_cohort"),
    ("new_sp_cur", "new_tb_cases_current"),
    ("new_sp_cmplt", "new_tb_cases_completed"),
    ("new_sp_died", "new_tb_cases_died"),
    ("new_sp_fail", "new_tb_cases_failed"),
    ("new_sp_def", "new_tb_cases_defaulted"),
    ("c_new_sp_tsr", "new_tb_treatment_success_rate"),
    // New cases (smear-negative / extra-pulmonary)
    ("new_snep_coh", "new_tb_snep_cohort"),
    ("new_snep_cmplt", "new_tb_snep_completed"),
    ("new_snep_died", "new_tb_snep_died"),
    ("new_snep_fail", "new_tb_snep_failed"),
    ("new_snep_def", "new_tb_snep_defaulted"),
    ("c_new_snep_tsr", "new_tb_snep_treatment_success_rate"),
    // Retreatment
    ("ret_coh", "retreatment_cohort"),
    ("ret_cur", "retreatment_current"),
    ("ret_cmplt", "retreatment_completed"),
    ("ret_died", "retreatment_died"),
    ("ret_fail", "retreatment_failed"),
    ("ret_def", "retreatment_defaulted"),
    ("c_ret_tsr", "retreatment_nonrelapse_success_rate"),
    // HIV co-infected, new cases
    ("hiv_new_sp_coh", "hiv_new_tb_cases_cohort"),
    ("hiv_new_sp_cur", "hiv_new_tb_cases_current"),
    ("hiv_new_sp_cmplt", "hiv_new_tb_cases_completed"),
    ("hiv_new_sp_died", "hiv_new_tb_cases_died"),
    ("hiv_new_sp_fail", "hiv_new_tb_cases_failed"),
    ("hiv_new_sp_def", "hiv_new_tb_cases_defaulted"),
    ("hiv_new_snep_coh", "hiv_new_tb_snep_cohort"),
    ("hiv_new_snep_cmplt", "hiv_new_tb_snep_completed"),
    ("hiv_new_snep_died", "hiv_new_tb_snep_died"),
    ("hiv_new_snep_fail", "hiv_new_tb_snep_failed"),
    ("hiv_new_snep_def", "hiv_new_tb_snep_defaulted"),
    // HIV co-infected, retreatment
    ("hiv_ret_coh", "hiv_retreatment_cohort"),
    ("hiv_ret_cur", "hiv_retreatment_current"),
    ("hiv_ret_cmplt", "hiv_retreatment_completed"),
    ("hiv_ret_died", "hiv_retreatment_died"),
    ("hiv_ret_fail", "hiv_retreatment_failed"),
    ("hiv_ret_def", "hiv_retreatment_defaulted"),
    // New and relapse
    ("newrel_coh", "new_relapse_cohort"),
    ("newrel_succ", "new_relapse_success"),
    ("newrel_fail", "new_relapse_failed"),
    ("newrel_died", "new_relapse_died"),
    ("newrel_lost", "new_relapse_lost"),
    ("c_new_tsr", "new_relapse_treatment_success_rate"),
    // Retreatment excluding relapse
    ("ret_nrel_coh", "retreatment_nonrelapse_cohort"),
    ("ret_nrel_succ", "retreatment_nonrelapse_success"),
    ("ret_nrel_fail", "retreatment_nonrelapse_failed"),
    ("ret_nrel_died", "retreatment_nonrelapse_died"),
    ("ret_nrel_lost", "retreatment_nonrelapse_lost"),
    // TB/HIV
    ("tbhiv_coh", "tbhiv_cohort"),
    ("tbhiv_succ", "tbhiv_success"),
    ("tbhiv_fail", "tbhiv_failed"),
    ("tbhiv_died", "tbhiv_died"),
    ("tbhiv_lost", "tbhiv_lost"),
    ("c_tbhiv_tsr", "tbhiv_treatment_success_rate"),
    // Multidrug-resistant
    ("mdr_coh", "multidrug_resistant_tb_cohort"),
    ("mdr_succ", "multidrug_resistant_tb_success"),
    ("mdr_fail", "multidrug_resistant_tb_failed"),
    ("mdr_died", "multidrug_resistant_tb_died"),
    ("mdr_lost", "multidrug_resistant_tb_lost"),
    // Extensively drug-resistant
    ("xdr_coh", "extensively_drug_resistant_tb_cohort"),
    ("xdr_succ", "extensively_drug_resistant_tb_success"),
    ("xdr_fail", "extensively_drug_resistant_tb_failed"),
    ("xdr_died", "extensively_drug_resistant_tb_died"),
    ("xdr_lost", "extensively_drug_resistant_tb_lost"),
];

/// HDRO composite indices endpoint used for UNDP HDI acquisition.
pub const HDRO_API_URL: &str = "https://hdrdata.org/api/CompositeIndices/query";

/// Environment variable holding the HDRO API key.
pub const HDRO_API_KEY_ENV: &str = "HDRO_API_KEY";

/// World Bank bulk download of tuberculosis incidence (SH.TBS.INCD).
pub const WORLDBANK_TB_URL: &str =
    "https://api.worldbank.org/v2/en/indicator/SH.TBS.INCD?downloadformat=csv";

/// Entry-name filters applied to World Bank bulk archives.
pub const DEFAULT_ARCHIVE_INCLUDE: &str = "API";
pub const DEFAULT_ARCHIVE_EXCLUDE: &str = "Metadata";
pub const WORLDBANK_TB_ARCHIVE_INCLUDE: &str = "API_SH.TBS.INCD";
