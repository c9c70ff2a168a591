//! Built-in plans for the course assignments graded so far.

use super::{Aggregation, EvaluationPlan, Exercise, FileSelector, SearchPath, DEFAULT_BRANCH_PREFIX};
use crate::{
    error::{Error, Result},
    rubric::{definition::compile_pattern, Check, Criterion, Rubric, Tier},
    walker::WalkLimits,
};

pub const PRESET_NAMES: [&str; 4] = [
    "async-js",
    "factory-order-manager",
    "thread-comparison",
    "thread-structure",
];

const UT1_PROJECT: &str = "src/com/mymodule/serviceprocessprogramming/ut1_concurrent_programming/project";
const UT2_PROJECT: &str = "src/com/mymodule/serviceprocessprogramming/ut2_multiprocess_programming/project";

pub fn preset(name: &str) -> Result<EvaluationPlan> {
    match name {
        "async-js" => async_js(),
        "factory-order-manager" => factory_order_manager(),
        "thread-comparison" => thread_comparison(),
        "thread-structure" => thread_structure(),
        other => Err(Error::UnknownPreset(other.to_string())),
    }
}

fn plan(name: &str, search_paths: Vec<SearchPath>, exercises: Vec<Exercise>) -> EvaluationPlan {
    EvaluationPlan {
        name: name.to_string(),
        branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
        search_paths,
        exercises,
        limits: WalkLimits::default(),
    }
}

fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn pattern(p: &str) -> Result<Check> {
    Ok(Check::Matches(compile_pattern(p)?))
}

/// JavaScript HTTP client exercise, every file under `src` graded on its own.
pub fn async_js() -> Result<EvaluationPlan> {
    let rubric = Rubric::new(
        "async-js",
        vec![
            Criterion::new(
                "async_await",
                "Correct use of async/await",
                2.0,
                "The code uses async/await correctly.",
                Check::ContainsAll(terms(&["async", "await"])),
            ),
            Criterion::new(
                "error_handling",
                "Error handling with try/catch",
                1.5,
                "Errors are handled with try/catch.",
                Check::ContainsAll(terms(&["try", "catch"])),
            ),
            Criterion::new(
                "axios",
                "Use of Axios",
                2.0,
                "The code uses Axios for HTTP requests.",
                Check::Contains("axios".to_string()),
            ),
            Criterion::new(
                "comments",
                "Code organisation and comments",
                1.3,
                "The code is organised and commented.",
                Check::ContainsAny(terms(&["//", "/*"])),
            ),
        ],
    )?;

    Ok(plan(
        "async-js",
        vec![SearchPath::new("src")],
        vec![Exercise::new("async_js", rubric)],
    ))
}

/// Order processing with child processes; submissions live in `ex1` or `ex2`.
pub fn factory_order_manager() -> Result<EvaluationPlan> {
    let input_stream = Check::AnyOf(vec![
        pattern(r"BufferedReader\s*\(.*?\)")?,
        pattern(r"InputStreamReader\s*\(.*?\)")?,
    ]);
    let output_stream = Check::AnyOf(vec![
        pattern(r"BufferedWriter\s*\(.*?\)")?,
        pattern(r"OutputStreamWriter\s*\(.*?\)")?,
    ]);

    let rubric = Rubric::new(
        "factory-order-manager",
        vec![
            Criterion::new(
                "read_orders",
                "Orders file pedidos.txt",
                2.0,
                "pedidos.txt is present and read.",
                Check::FilePresent("pedidos.txt".to_string()),
            ),
            Criterion::new(
                "process_builder",
                "Child processes launched with ProcessBuilder",
                2.0,
                "ProcessBuilder is used to launch the workers.",
                Check::Contains("ProcessBuilder".to_string()),
            ),
            Criterion::new(
                "io_streams",
                "Input and output streams between processes",
                2.0,
                "Input and output streams are wired between processes.",
                Check::AllOf(vec![input_stream, output_stream]),
            ),
            Criterion::new(
                "logs",
                "One log file per order",
                2.0,
                "Log files were generated for the orders.",
                Check::FileCount {
                    prefix: "log_pedido_".to_string(),
                    credit_per_file: 0.25,
                },
            ),
            Criterion::new(
                "organization",
                "README.md documents the project",
                1.7,
                "README.md is present and documents the project.",
                Check::FilePresent("README.md".to_string()),
            ),
        ],
    )?;

    Ok(plan(
        "factory-order-manager",
        vec![
            SearchPath::new(format!("{}/ex1", UT2_PROJECT)),
            SearchPath::new(format!("{}/ex2", UT2_PROJECT)),
        ],
        vec![Exercise::new("factory_order_manager", rubric).graded_over(9.7)],
    ))
}

/// Criteria of the thread comparison assignment, all worth 10 points.
const THREAD_CRITERIA: [(&str, &str, &str); 8] = [
    (
        "executor_service",
        "ExecutorService configured correctly",
        "An ExecutorService with a thread pool receives the tasks through submit().",
    ),
    (
        "custom_tasks",
        "Custom tasks implemented correctly",
        "Each task runs its own calculation with suitable waiting times.",
    ),
    (
        "thread_types",
        "Traditional and virtual threads used",
        "Traditional and virtual threads live in separate classes.",
    ),
    (
        "console_output",
        "Complete and clear console output",
        "The console shows the thread id, the calculation and its running time.",
    ),
    (
        "comparison_analysis",
        "Comparison chart and analysis",
        "A chart compares the response time of both versions, with a written analysis.",
    ),
    (
        "documentation",
        "Clear documentation in README.md",
        "README.md holds the chart, console captures and the analysis.",
    ),
    (
        "code_structure",
        "Code structure and organisation",
        "Well named classes with clear comments.",
    ),
    (
        "git_usage",
        "Organised delivery on GitHub",
        "Code and documentation are on a correctly named branch, in the expected places.",
    ),
];

/// Every criterion gets 70% of its points when `file` was delivered and 30%
/// otherwise.
fn delivery_rubric(name: &str, file: &str) -> Result<Rubric> {
    let criteria = THREAD_CRITERIA
        .iter()
        .map(|(id, description, feedback)| {
            Criterion::new(
                *id,
                *description,
                10.0,
                *feedback,
                Check::Tiered(vec![
                    Tier {
                        check: Check::FilePresent(file.to_string()),
                        credit: 0.7,
                    },
                    Tier {
                        check: Check::Always,
                        credit: 0.3,
                    },
                ]),
            )
        })
        .collect();
    Rubric::new(name, criteria)
}

/// Traditional vs virtual threads, each graded over 40 points and averaged.
pub fn thread_comparison() -> Result<EvaluationPlan> {
    Ok(plan(
        "thread-comparison",
        vec![
            SearchPath::new(UT1_PROJECT),
            SearchPath::new(UT1_PROJECT.trim_start_matches("src/")),
        ],
        vec![
            Exercise::new(
                "traditional",
                delivery_rubric("traditional-threads", "TraditionalThreads.java")?,
            )
            .with_files(FileSelector::named(&["TraditionalThreads.java"]))
            .graded_over(40.0),
            Exercise::new(
                "virtual",
                delivery_rubric("virtual-threads", "VirtualThreads.java")?,
            )
            .with_files(FileSelector::named(&["VirtualThreads.java"]))
            .graded_over(40.0),
        ],
    ))
}

/// Structure-only check of the same project, tolerating misplaced folders at
/// a penalty.
pub fn thread_structure() -> Result<EvaluationPlan> {
    let mut criteria = ["TraditionalThreads.java", "VirtualThreads.java", "README.md"]
        .iter()
        .map(|file| {
            Criterion::new(
                format!("structure_{}", file.to_lowercase().replace('.', "_")),
                format!("Expected file {}", file),
                2.0,
                format!("{} is in place.", file),
                Check::FilePresent(file.to_string()),
            )
        })
        .collect::<Vec<_>>();
    criteria.push(Criterion::new(
        "documentation",
        "README.md with captures and charts",
        10.0,
        "README.md is present.",
        Check::FilePresent("README.md".to_string()),
    ));
    criteria.push(Criterion::new(
        "git_usage",
        "Delivered on a correctly named branch",
        10.0,
        "The branch follows the naming convention.",
        Check::BranchPrefix(DEFAULT_BRANCH_PREFIX.to_string()),
    ));

    let rubric = Rubric::new("thread-structure", criteria)?;

    Ok(plan(
        "thread-structure",
        vec![
            SearchPath::new(UT1_PROJECT),
            SearchPath::new(UT1_PROJECT.trim_start_matches("src/")),
            SearchPath::penalised("src/main/java", 5.0),
            SearchPath::penalised("src", 5.0),
            SearchPath::penalised(
                "src/com/mymodule/serviceprocessprogramming/f1_concurrent_programming/project",
                5.0,
            ),
            SearchPath::penalised("src/com/mymodule/serviceprocessprogramming/project", 5.0),
        ],
        vec![Exercise::new("structure", rubric)
            .with_files(FileSelector::named(&["README.md"]))
            .with_aggregation(Aggregation::Concatenated)],
    ))
}
