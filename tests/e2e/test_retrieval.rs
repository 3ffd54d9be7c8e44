use crate::e2e::helpers;

use helpers::TestContext;
use phrase_study_backend::domain::phrase::{
    PhraseServiceApi, PhraseServiceError, SelectionPolicy, MAX_SESSION_LENGTH,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use test_context::test_context;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_surface_least_used_phrase_first(ctx: &TestContext) {
    let practiced = ctx.fixtures.create_phrase("練習済みの文。", 20).await.unwrap();
    let fresh = ctx.fixtures.create_phrase("新しい文。", 10).await.unwrap();
    ctx.fixtures.set_usage_count(&practiced.hash, 3).await.unwrap();

    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 1)
        .await
        .unwrap();

    assert_eq!(session.phrases.len(), 1);
    assert_eq!(session.phrases[0].hash, fresh.hash);
    assert_eq!(ctx.fixtures.usage_count(&fresh.hash).await.unwrap(), Some(1));
    assert_eq!(ctx.fixtures.usage_count(&practiced.hash).await.unwrap(), Some(3));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_cycle_through_every_phrase_under_frequency_policy(ctx: &TestContext) {
    let texts = ["一つ目。", "二つ目。", "三つ目。"];
    for (i, text) in texts.iter().enumerate() {
        ctx.fixtures.create_phrase(text, 30 - i as i64).await.unwrap();
    }

    let mut served: HashMap<String, usize> = HashMap::new();
    for round in 0..2 {
        let mut this_round = Vec::new();
        for _ in 0..texts.len() {
            let session = ctx
                .phrase_service
                .retrieve(SelectionPolicy::Frequency, 1)
                .await
                .unwrap();
            let hash = session.phrases[0].hash.clone();
            *served.entry(hash.clone()).or_default() += 1;
            this_round.push(hash);
        }

        // Every phrase is served once before any is served twice
        this_round.sort();
        this_round.dedup();
        assert_eq!(this_round.len(), texts.len(), "round {round} repeated a phrase");
    }

    assert!(served.values().all(|&n| n == 2), "served: {served:?}");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_oldest_first_under_recency_policy(ctx: &TestContext) {
    let newest = ctx.fixtures.create_phrase("最新の文。", 1).await.unwrap();
    let oldest = ctx.fixtures.create_phrase("最古の文。", 300).await.unwrap();
    let middle = ctx.fixtures.create_phrase("中間の文。", 60).await.unwrap();

    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Recency, 3)
        .await
        .unwrap();

    let hashes: Vec<&str> = session.phrases.iter().map(|p| p.hash.as_str()).collect();
    assert_eq!(hashes, vec![oldest.hash.as_str(), middle.hash.as_str(), newest.hash.as_str()]);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_bump_only_selected_phrases(ctx: &TestContext) {
    let oldest = ctx.fixtures.create_phrase("古い文。", 100).await.unwrap();
    let newer = ctx.fixtures.create_phrase("新しい文。", 10).await.unwrap();

    ctx.phrase_service
        .retrieve(SelectionPolicy::Recency, 1)
        .await
        .unwrap();

    assert_eq!(ctx.fixtures.usage_count(&oldest.hash).await.unwrap(), Some(1));
    assert_eq!(ctx.fixtures.usage_count(&newer.hash).await.unwrap(), Some(0));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_clamp_session_length(ctx: &TestContext) {
    ctx.fixtures.create_phrase("一つ目。", 20).await.unwrap();
    ctx.fixtures.create_phrase("二つ目。", 10).await.unwrap();

    let everything = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, MAX_SESSION_LENGTH + 100)
        .await
        .unwrap();
    assert_eq!(everything.phrases.len(), 2);

    let at_least_one = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 0)
        .await
        .unwrap();
    assert_eq!(at_least_one.phrases.len(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_empty_session_when_nothing_is_stored(ctx: &TestContext) {
    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 5)
        .await
        .unwrap();

    assert!(session.phrases.is_empty());
    assert!(session.playback.is_none());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_not_found_for_random_on_empty_store(ctx: &TestContext) {
    let result = ctx.phrase_service.random().await;

    assert!(matches!(result, Err(PhraseServiceError::NotFound(_))));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_pick_random_phrase_and_bump_it(ctx: &TestContext) {
    let only = ctx.fixtures.create_phrase("唯一の文。", 5).await.unwrap();

    let session = ctx.phrase_service.random().await.unwrap();

    assert_eq!(session.phrases[0].hash, only.hash);
    assert!(session.playback.is_some());
    assert_eq!(ctx.fixtures.usage_count(&only.hash).await.unwrap(), Some(1));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_find_phrase_without_touching_usage(ctx: &TestContext) {
    let record = ctx.fixtures.create_phrase("探す文。", 5).await.unwrap();

    let session = ctx.phrase_service.find(&record.hash).await.unwrap();

    assert_eq!(session.phrases, vec![record.clone()]);
    assert!(session.playback.is_some());
    assert_eq!(ctx.fixtures.usage_count(&record.hash).await.unwrap(), Some(0));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_hash(ctx: &TestContext) {
    let result = ctx.phrase_service.find("../meta").await;
    assert!(matches!(result, Err(PhraseServiceError::Invalid(_))));

    let result = ctx.phrase_service.delete("ABC").await;
    assert!(matches!(result, Err(PhraseServiceError::Invalid(_))));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_never_select_pending_phrases(ctx: &TestContext) {
    let visible = ctx.fixtures.create_phrase("見える文。", 10).await.unwrap();
    let pending = helpers::fixtures::record_for("生成中の文。", chrono::Utc::now());
    ctx.index_repo
        .insert(&pending.hash, pending.created_at)
        .await
        .unwrap();

    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 5)
        .await
        .unwrap();

    assert_eq!(session.phrases.len(), 1);
    assert_eq!(session.phrases[0].hash, visible.hash);
    assert!(matches!(
        ctx.phrase_service.find(&pending.hash).await,
        Err(PhraseServiceError::NotFound(_))
    ));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_remove_deleted_phrase_from_retrieval_and_keep_history(ctx: &TestContext) {
    let kept = ctx.fixtures.create_phrase("残す文。", 20).await.unwrap();
    let removed = ctx.fixtures.create_phrase("消す文。", 10).await.unwrap();

    ctx.phrase_service.delete(&removed.hash).await.unwrap();

    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 5)
        .await
        .unwrap();
    let hashes: Vec<&str> = session.phrases.iter().map(|p| p.hash.as_str()).collect();
    assert_eq!(hashes, vec![kept.hash.as_str()]);

    assert_eq!(ctx.fixtures.track_count(&removed.hash).await.unwrap(), 0);
    assert!(ctx.log_repo.find(&removed.hash).await.unwrap().is_some());
    assert_eq!(ctx.fixtures.index_row_count().await.unwrap(), 1);

    let again = ctx.phrase_service.delete(&removed.hash).await;
    assert!(matches!(again, Err(PhraseServiceError::NotFound(_))));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_allow_regenerating_a_deleted_phrase(ctx: &TestContext) {
    let first = ctx.phrase_service.generate("また会いましょう。".to_string()).await.unwrap();
    ctx.phrase_service.delete(&first.hash).await.unwrap();

    let second = ctx
        .phrase_service
        .generate("また会いましょう。".to_string())
        .await
        .unwrap();

    assert_eq!(second.hash, first.hash);
    // Both records stay in the log; lookups see the latest
    assert_eq!(ctx.log_repo.all().await.unwrap().len(), 2);
    let found = ctx.log_repo.find(&second.hash).await.unwrap().unwrap();
    assert_eq!(found.created_at, second.created_at);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_block_generation_while_delete_is_in_progress(ctx: &TestContext) {
    let record = ctx.fixtures.create_phrase("途中の文。", 10).await.unwrap();

    // Delete has retired the row but not yet removed the tracks
    assert!(ctx.index_repo.retire(&record.hash).await.unwrap());

    let result = ctx.phrase_service.generate("途中の文。".to_string()).await;
    assert!(matches!(result, Err(PhraseServiceError::Duplicate(_))));
    assert_eq!(ctx.speaker.call_count(), 0);

    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 5)
        .await
        .unwrap();
    assert!(session.phrases.is_empty());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_never_strip_tracks_from_a_concurrent_regeneration(ctx: &TestContext) {
    for round in 0..8 {
        let text = format!("{round}回目の文。");
        let record = ctx.fixtures.create_phrase(&text, 10).await.unwrap();

        let (deleted, generated) = tokio::join!(
            ctx.phrase_service.delete(&record.hash),
            ctx.phrase_service.generate(text.clone()),
        );
        deleted.unwrap();

        match generated {
            Ok(regenerated) => {
                assert_eq!(ctx.fixtures.track_count(&regenerated.hash).await.unwrap(), 5);
                assert!(ctx.phrase_service.find(&regenerated.hash).await.is_ok());
            }
            Err(PhraseServiceError::Duplicate(_)) => {
                assert!(ctx.index_repo.find(&record.hash).await.unwrap().is_none());
            }
            Err(other) => panic!("unexpected generation error: {other:?}"),
        }
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_bump_each_phrase_once_under_concurrent_retrieval(ctx: &TestContext) {
    for (i, text) in ["甲。", "乙。", "丙。", "丁。"].iter().enumerate() {
        ctx.fixtures.create_phrase(text, 40 - i as i64).await.unwrap();
    }

    let retrievals = (0..4).map(|_| {
        let service = ctx.phrase_service.clone();
        async move { service.retrieve(SelectionPolicy::Frequency, 1).await }
    });
    let results = futures::future::join_all(retrievals).await;

    let mut served: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().phrases[0].hash.clone())
        .collect();
    served.sort();
    served.dedup();
    assert_eq!(served.len(), 4, "two retrievals served the same phrase");
}
