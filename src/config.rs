/*
 * This modules contains the `EvalConfig` struct, which implements the default trait, and its
 * builder. The config is given to the `EvaluationPipeline` or to the `evaluate_file` function to
 * simplify their arguments.
*/
use crate::schema::Schema;
use std::fmt::Display;

#[derive(Clone, Debug, PartialEq)]
/// Config struct used to simplify the inputs of the evaluation functions. It implements the
/// default trait.
pub struct EvalConfig {
    /// If `true`, a discontinuous entity is split into one span per `(start, end)` pair when it
    /// is scored. Otherwise, it is scored as a single span going from its first start to its last
    /// end.
    discontinuous_spans: bool,
    /// Span-matching schema used for the entity-level metrics.
    schema: Schema,
    /// Minimal fraction of the elements of a gold event that must be recovered by a single
    /// predicted event for the gold event to be relaxed-complete.
    completeness_threshold: f64,
    /// Number of occurrences a predicted event element can hold without them being in the gold
    /// element. With `0`, predicted occurrences must be a subset of the gold occurrences.
    max_false_occurrences: usize,
    /// Reserved. Has no effect on the evaluation.
    strict_loading: bool,
    /// Can we use multiple cores to evaluate the prediction files? Each file is evaluated
    /// independently of the others.
    parallel: bool,
}

impl EvalConfig {
    pub fn new() -> Self {
        Self {
            discontinuous_spans: true,
            schema: Schema::Strict,
            completeness_threshold: 0.5,
            max_false_occurrences: 0,
            strict_loading: false,
            parallel: false,
        }
    }
    pub fn discontinuous_spans(&self) -> bool {
        self.discontinuous_spans
    }
    pub fn schema(&self) -> Schema {
        self.schema
    }
    pub fn completeness_threshold(&self) -> f64 {
        self.completeness_threshold
    }
    pub fn max_false_occurrences(&self) -> usize {
        self.max_false_occurrences
    }
    pub fn strict_loading(&self) -> bool {
        self.strict_loading
    }
    pub fn parallel(&self) -> bool {
        self.parallel
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<EvalConfigBuilder> for EvalConfig {
    fn from(value: EvalConfigBuilder) -> Self {
        Self {
            discontinuous_spans: value.discontinuous_spans,
            schema: value.schema,
            completeness_threshold: value.completeness_threshold,
            max_false_occurrences: value.max_false_occurrences,
            strict_loading: value.strict_loading,
            parallel: value.parallel,
        }
    }
}

impl Display for EvalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let string = format!("Splitting discontinuous spans: {}\n Span-matching schema: {}\n Completeness threshold: {}\n Tolerated false occurrences: {}\n Using strict loading: {}\n Using parallel computations: {}", self.discontinuous_spans, self.schema, self.completeness_threshold, self.max_false_occurrences, self.strict_loading, self.parallel);
        write!(f, "{}", string)
    }
}

/// This builder can be used to build and customize an `EvalConfig` stucture.
#[derive(Clone, Debug)]
pub struct EvalConfigBuilder {
    discontinuous_spans: bool,
    schema: Schema,
    completeness_threshold: f64,
    max_false_occurrences: usize,
    strict_loading: bool,
    parallel: bool,
}

impl Default for EvalConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalConfigBuilder {
    pub fn discontinuous_spans(mut self, discontinuous_spans: bool) -> Self {
        self.discontinuous_spans = discontinuous_spans;
        self
    }
    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }
    pub fn completeness_threshold(mut self, completeness_threshold: f64) -> Self {
        self.completeness_threshold = completeness_threshold;
        self
    }
    pub fn max_false_occurrences(mut self, max_false_occurrences: usize) -> Self {
        self.max_false_occurrences = max_false_occurrences;
        self
    }
    pub fn strict_loading(mut self, strict_loading: bool) -> Self {
        self.strict_loading = strict_loading;
        self
    }
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
    pub fn new() -> Self {
        let defaults = EvalConfig::new();
        Self {
            discontinuous_spans: defaults.discontinuous_spans,
            schema: defaults.schema,
            completeness_threshold: defaults.completeness_threshold,
            max_false_occurrences: defaults.max_false_occurrences,
            strict_loading: defaults.strict_loading,
            parallel: defaults.parallel,
        }
    }
    pub fn build(self) -> EvalConfig {
        EvalConfig::from(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = EvalConfigBuilder::default().build();
        assert_eq!(config, EvalConfig::default());
        assert!(config.discontinuous_spans());
        assert_eq!(config.schema(), Schema::Strict);
        assert_eq!(config.completeness_threshold(), 0.5);
        assert_eq!(config.max_false_occurrences(), 0);
        assert!(!config.strict_loading());
        assert!(!config.parallel());
    }

    #[rstest]
    #[case(Schema::Strict)]
    #[case(Schema::Exact)]
    #[case(Schema::Partial)]
    #[case(Schema::Type)]
    fn test_builder_setters_schema(#[case] schema: Schema) {
        let builder = EvalConfigBuilder::default();
        let config = builder.schema(schema).build();
        assert_eq!(config.schema(), schema)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_parallel(#[case] parallel: bool) {
        let builder = EvalConfigBuilder::default();
        let config = builder.parallel(parallel).build();
        assert_eq!(config.parallel(), parallel)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_builder_setters_discontinuous_spans(#[case] discontinuous_spans: bool) {
        let builder = EvalConfigBuilder::default();
        let config = builder.discontinuous_spans(discontinuous_spans).build();
        assert_eq!(config.discontinuous_spans(), discontinuous_spans)
    }

    #[rstest]
    #[case(0.0)]
    #[case(0.75)]
    fn test_builder_setters_completeness_threshold(#[case] threshold: f64) {
        let builder = EvalConfigBuilder::default();
        let config = builder.completeness_threshold(threshold).build();
        assert_eq!(config.completeness_threshold(), threshold)
    }

    #[test]
    fn test_builder_setters_occurrences_and_loading() {
        let config = EvalConfigBuilder::new()
            .max_false_occurrences(2)
            .strict_loading(true)
            .build();
        assert_eq!(config.max_false_occurrences(), 2);
        assert!(config.strict_loading());
        assert!(config.to_string().contains("Tolerated false occurrences: 2"));
    }
}
