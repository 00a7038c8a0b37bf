//! End-to-end tests of a classification: decode, submit, apply reports to the
//! formatter and render the label text.

mod common;

use std::time::Duration;

use otofind::acquisition::decode_file;
use otofind::classification::ModelSet;

use common::*;

const TIMEOUT: Duration = Duration::from_secs(5);

fn two_model_runner(aom: f32, csom: f32) -> anyhow::Result<InferenceRunner> {
    InferenceRunner::new(model_set(vec![
        (AOM_TAG, shared(FixedScore(aom))),
        (CSOM_TAG, shared(FixedScore(csom))),
    ]))
}

/// Submit, begin and apply every report in the order the handles resolve
async fn classify(
    runner: &InferenceRunner,
    formatter: &mut ResultFormatter,
    request: InferenceRequest,
) -> anyhow::Result<String> {
    let submission = runner.submit(request)?;
    formatter.begin(submission.request);
    assert_eq!(formatter.render(), CLASSIFYING_TEXT);

    let expected = submission.len();
    for handle in submission.handles {
        formatter.apply(handle.outcome_within(TIMEOUT).await);
    }
    assert!(formatter.is_settled(expected));
    Ok(formatter.render())
}

#[tokio::test]
async fn test_two_scores_are_listed() -> anyhow::Result<()> {
    let runner = two_model_runner(0.873, 0.021)?;
    let mut formatter = ResultFormatter::default();

    let text = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;

    assert_eq!(
        text,
        "Acute Otitis Media: 87.3%\nChronic Suppurative Otitis Media: 2.1%"
    );
    Ok(())
}

#[tokio::test]
async fn test_classifying_shown_before_any_result() -> anyhow::Result<()> {
    let (gated_model, gate) = gated(0.4);
    let runner = InferenceRunner::new(model_set(vec![(AOM_TAG, shared(gated_model))]))?;
    let mut formatter = ResultFormatter::default();

    let submission = runner.submit(InferenceRequest::upright(test_image()))?;
    formatter.begin(submission.request);
    gate.started.recv()?;
    assert_eq!(formatter.render(), CLASSIFYING_TEXT);

    gate.release.send(())?;
    for report in submission.collect_within(TIMEOUT).await {
        formatter.apply(report);
    }
    assert_eq!(formatter.render(), "Acute Otitis Media: 40.0%");
    Ok(())
}

#[tokio::test]
async fn test_missing_output_shows_error() -> anyhow::Result<()> {
    let runner = InferenceRunner::new(model_set(vec![
        (AOM_TAG, shared(NoOutput)),
        (CSOM_TAG, shared(FixedScore(0.3))),
    ]))?;
    let mut formatter = ResultFormatter::default();

    let text = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;
    assert_eq!(text, ERROR_TEXT);
    Ok(())
}

#[tokio::test]
async fn test_error_replaces_earlier_score() -> anyhow::Result<()> {
    let runner = InferenceRunner::new(model_set(vec![
        (CSOM_TAG, shared(FixedScore(0.021))),
        (AOM_TAG, shared(Failing)),
    ]))?;
    let mut formatter = ResultFormatter::default();

    let text = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;
    assert_eq!(text, ERROR_TEXT);
    Ok(())
}

#[tokio::test]
async fn test_isolated_failures_keep_other_scores() -> anyhow::Result<()> {
    let runner = InferenceRunner::new(model_set(vec![
        (CSOM_TAG, shared(FixedScore(0.021))),
        (AOM_TAG, shared(Panicking)),
    ]))?;
    let mut formatter = ResultFormatter::new(MergePolicy::Isolated, 1);

    let text = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;
    assert_eq!(
        text,
        "Chronic Suppurative Otitis Media: 2.1%\nAcute Otitis Media: An error has occured."
    );
    Ok(())
}

#[tokio::test]
async fn test_same_image_gives_same_text() -> anyhow::Result<()> {
    let runner = two_model_runner(0.5, 0.125)?;
    let mut formatter = ResultFormatter::default();

    let first = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;
    let second = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;

    assert_eq!(first, second);
    assert_eq!(
        first,
        "Acute Otitis Media: 50.0%\nChronic Suppurative Otitis Media: 12.5%"
    );
    Ok(())
}

#[tokio::test]
async fn test_new_photo_clears_previous_error() -> anyhow::Result<()> {
    let runner = InferenceRunner::new(model_set(vec![(AOM_TAG, shared(FixedScore(0.6)))]))?;
    let failing = InferenceRunner::new(model_set(vec![(AOM_TAG, shared(Failing))]))?;
    let mut formatter = ResultFormatter::default();

    let text = classify(&failing, &mut formatter, InferenceRequest::upright(test_image())).await?;
    assert_eq!(text, ERROR_TEXT);

    let text = classify(&runner, &mut formatter, InferenceRequest::upright(test_image())).await?;
    assert_eq!(text, "Acute Otitis Media: 60.0%");
    Ok(())
}

#[tokio::test]
async fn test_stale_reports_do_not_reach_the_label() -> anyhow::Result<()> {
    let runner = two_model_runner(0.9, 0.8)?;
    let mut formatter = ResultFormatter::default();

    let first = runner.submit(InferenceRequest::upright(test_image()))?;
    formatter.begin(first.request);
    let second = runner.submit(InferenceRequest::upright(test_image()))?;
    formatter.begin(second.request);

    for report in first.collect_within(TIMEOUT).await {
        assert!(!formatter.apply(report));
    }
    assert_eq!(formatter.render(), CLASSIFYING_TEXT);

    for report in second.collect_within(TIMEOUT).await {
        formatter.apply(report);
    }
    assert!(formatter.is_settled(2));
    Ok(())
}

#[tokio::test]
async fn test_decoded_photo_is_classified() -> anyhow::Result<()> {
    let file = create_test_image_file();
    let acquired = decode_file(file.path())?;
    assert_eq!(acquired.image.width(), 64);
    assert_eq!(acquired.image.height(), 48);

    let runner = two_model_runner(0.873, 0.021)?;
    let mut formatter = ResultFormatter::default();
    let text = classify(&runner, &mut formatter, acquired.into_request()).await?;

    assert_eq!(
        text,
        "Acute Otitis Media: 87.3%\nChronic Suppurative Otitis Media: 2.1%"
    );
    Ok(())
}

#[test]
fn test_model_set_rejects_duplicates() {
    let result = ModelSet::from_models(vec![
        (AOM_TAG.to_string(), shared(FixedScore(0.1))),
        (AOM_TAG.to_string(), shared(FixedScore(0.2))),
    ]);
    assert!(result.is_err());
}
