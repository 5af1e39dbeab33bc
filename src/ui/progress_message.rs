/// Events reported to the progress display while linting
#[derive(Clone, Debug)]
pub enum ProgressMessage {
    Started { total: usize },
    Analyzed { file: String, errors: usize, warnings: usize },
    Failed { file: String },
    Finished,
}
