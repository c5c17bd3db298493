// Copyright (c) The plugin-results Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading JUnit XML reports.

use super::{ProcessedFile, base_name, relative_path};
use crate::{
    aggregate::aggregate_status,
    errors::ProcessFileError,
    item::{
        Item, METADATA_ERROR_KEY, METADATA_FILE_KEY, METADATA_TYPE_FILE, METADATA_TYPE_KEY,
        Status,
    },
};
use camino::Utf8Path;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::io::{BufRead, BufReader};

static TESTSUITE_TAG: &[u8] = b"testsuite";
static TESTCASE_TAG: &[u8] = b"testcase";
static FAILURE_TAG: &[u8] = b"failure";
static ERROR_TAG: &[u8] = b"error";
static SKIPPED_TAG: &[u8] = b"skipped";
static SYSTEM_OUT_TAG: &[u8] = b"system-out";
static SYSTEM_ERR_TAG: &[u8] = b"system-err";

const FAILURE_DETAIL_KEY: &str = "failure";
const SYSTEM_OUT_DETAIL_KEY: &str = "system-out";
const SYSTEM_ERR_DETAIL_KEY: &str = "system-err";

/// Processes a JUnit XML report.
///
/// The result is a file item with one child per test suite, each holding one leaf per test case.
/// The status of the file item and its suites is the automatic rollup of the test cases.
pub fn process_junit_file(plugin_dir: &Utf8Path, file: &Utf8Path) -> ProcessedFile {
    let mut item = Item::leaf(base_name(file), Status::Unknown);
    item.set_metadata(METADATA_FILE_KEY, relative_path(plugin_dir, file))
        .set_metadata(METADATA_TYPE_KEY, METADATA_TYPE_FILE);

    let infile = match fs_err::File::open(file) {
        Ok(infile) => infile,
        Err(error) => {
            item.set_metadata(METADATA_ERROR_KEY, error.to_string());
            return ProcessedFile::partial(
                item,
                ProcessFileError::Open {
                    path: file.to_owned(),
                    error,
                },
            );
        }
    };

    match parse_junit(BufReader::new(infile)) {
        Ok(suites) => {
            item.items = suites;
            item.status = Some(aggregate_status(&mut item.items));
            ProcessedFile::ok(item)
        }
        Err(error) => {
            item.set_metadata(METADATA_ERROR_KEY, error.to_string());
            ProcessedFile::partial(
                item,
                ProcessFileError::Junit {
                    path: file.to_owned(),
                    error,
                },
            )
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum TextTarget {
    Failure,
    SystemOut,
    SystemErr,
}

#[derive(Debug)]
struct TestCase {
    name: String,
    skipped: bool,
    failed: bool,
    failure: String,
    system_out: String,
    system_err: String,
}

impl TestCase {
    fn new(start: &BytesStart<'_>) -> quick_xml::Result<Self> {
        Ok(Self {
            name: attribute(start, "name")?.unwrap_or_default(),
            skipped: false,
            failed: false,
            failure: String::new(),
            system_out: String::new(),
            system_err: String::new(),
        })
    }

    fn text_mut(&mut self, target: TextTarget) -> &mut String {
        match target {
            TextTarget::Failure => &mut self.failure,
            TextTarget::SystemOut => &mut self.system_out,
            TextTarget::SystemErr => &mut self.system_err,
        }
    }

    fn into_item(self) -> Item {
        let status = if self.skipped {
            Status::Skipped
        } else if self.failed {
            Status::Failed
        } else {
            Status::Passed
        };

        let mut item = Item::leaf(self.name, status);
        for (key, value) in [
            (FAILURE_DETAIL_KEY, self.failure),
            (SYSTEM_OUT_DETAIL_KEY, self.system_out),
            (SYSTEM_ERR_DETAIL_KEY, self.system_err),
        ] {
            let value = value.trim();
            if !value.is_empty() {
                item.set_detail(key, value);
            }
        }
        item
    }
}

/// Reads every test suite in a report, in the order the suites are closed.
///
/// The root element may be either `<testsuites>` or a single `<testsuite>`. Suites without a
/// name attribute are named after their position in the report.
fn parse_junit(input: impl BufRead) -> quick_xml::Result<Vec<Item>> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut suites = Vec::new();
    let mut open_suites: Vec<Item> = Vec::new();
    let mut current_case: Option<TestCase> = None;
    let mut text_target: Option<TextTarget> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(start) => {
                let tag = start.name();
                if tag.as_ref() == TESTSUITE_TAG {
                    open_suites.push(new_suite(&start, suites.len() + open_suites.len())?);
                } else if tag.as_ref() == TESTCASE_TAG {
                    current_case = Some(TestCase::new(&start)?);
                } else if let Some(case) = current_case.as_mut() {
                    text_target = case_child(case, &start)?;
                }
            }
            Event::Empty(start) => {
                let tag = start.name();
                if tag.as_ref() == TESTSUITE_TAG {
                    let suite = new_suite(&start, suites.len() + open_suites.len())?;
                    suites.push(suite);
                } else if tag.as_ref() == TESTCASE_TAG {
                    let case = TestCase::new(&start)?;
                    if let Some(suite) = open_suites.last_mut() {
                        suite.items.push(case.into_item());
                    }
                } else if let Some(case) = current_case.as_mut() {
                    case_child(case, &start)?;
                }
            }
            Event::Text(text) => {
                if let (Some(case), Some(target)) = (current_case.as_mut(), text_target) {
                    case.text_mut(target).push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let (Some(case), Some(target)) = (current_case.as_mut(), text_target) {
                    case.text_mut(target)
                        .push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::End(end) => {
                let tag = end.name();
                if tag.as_ref() == TESTSUITE_TAG {
                    if let Some(suite) = open_suites.pop() {
                        suites.push(suite);
                    }
                } else if tag.as_ref() == TESTCASE_TAG {
                    // Test cases outside of any suite are dropped.
                    let case = current_case.take();
                    if let (Some(case), Some(suite)) = (case, open_suites.last_mut()) {
                        suite.items.push(case.into_item());
                    }
                    text_target = None;
                } else {
                    text_target = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(suites)
}

fn new_suite(start: &BytesStart<'_>, index: usize) -> quick_xml::Result<Item> {
    let name = attribute(start, "name")?.unwrap_or_else(|| format!("testsuite-{index}"));
    Ok(Item::leaf(name, Status::Unknown))
}

/// Records an element nested inside a test case, returning where its text should go.
fn case_child(
    case: &mut TestCase,
    start: &BytesStart<'_>,
) -> quick_xml::Result<Option<TextTarget>> {
    let tag = start.name();
    let target = if tag.as_ref() == FAILURE_TAG || tag.as_ref() == ERROR_TAG {
        case.failed = true;
        if let Some(message) = attribute(start, "message")? {
            if !case.failure.is_empty() {
                case.failure.push('\n');
            }
            case.failure.push_str(&message);
            case.failure.push('\n');
        }
        Some(TextTarget::Failure)
    } else if tag.as_ref() == SKIPPED_TAG {
        case.skipped = true;
        None
    } else if tag.as_ref() == SYSTEM_OUT_TAG {
        Some(TextTarget::SystemOut)
    } else if tag.as_ref() == SYSTEM_ERR_TAG {
        Some(TextTarget::SystemErr)
    } else {
        None
    };
    Ok(target)
}

fn attribute(start: &BytesStart<'_>, name: &str) -> quick_xml::Result<Option<String>> {
    match start.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}
