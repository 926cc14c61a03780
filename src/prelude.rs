pub use crate::data_structs::{
    bin_column_name,
    parse_bin_column,
    AnovaResult,
    AnovaRow,
    BinLongTable,
    FilterCriteria,
    FilteredDataset,
    RawTable,
    ScalarValue,
    BIN_COLUMN,
};
pub use crate::error::{
    AnalysisError,
    StatResult,
};
pub use crate::io::{
    normalize_headers,
    read_sheet,
    read_sheet_path,
};
pub use crate::tools::anova::{
    one_way_anova,
    two_way_anova,
    TwoWayAnova,
};
pub use crate::tools::outliers::{
    coerce_numeric,
    filter_numeric_series,
    grubbs_filter,
    GRUBBS_ALPHA,
};
pub use crate::tools::plot::{
    EncodedImage,
    InteractionPlotRequest,
    InteractionPlotter,
    JsonPlotter,
    NoopPlotter,
};
pub use crate::tools::request::{
    run_analysis,
    AnalysisConfig,
    AnalysisKind,
    AnalysisOutcome,
    AnalysisRequest,
};
pub use crate::tools::reshape::reshape_bins;
pub use crate::tools::stats::{
    display_stat_info,
    normality_tests,
    null_hypothesis_tests,
    HypothesisReport,
    NormalityReport,
    StatInfo,
    TestKind,
    TestResult,
};
