use crate::e2e::helpers;

use helpers::fakes::FAKE_TRACK_FRAMES;
use helpers::TestContext;
use phrase_study_backend::domain::audio::{AudioClip, AudioFormat};
use phrase_study_backend::domain::phrase::{PhraseServiceApi, PhraseServiceError, SelectionPolicy};
use phrase_study_backend::domain::playback::{PlaybackError, SILENCE_GAP_SECS};
use pretty_assertions::assert_eq;
use test_context::test_context;

const VOICES: usize = 5;

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_follow_every_track_with_a_silence_gap(ctx: &TestContext) {
    ctx.fixtures.create_phrase("一つ目。", 20).await.unwrap();
    ctx.fixtures.create_phrase("二つ目。", 10).await.unwrap();

    let session = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Recency, 2)
        .await
        .unwrap();
    let playback = session.playback.unwrap();

    let gap_frames = (SILENCE_GAP_SECS * 16000) as usize;
    let expected_frames = 2 * VOICES * (FAKE_TRACK_FRAMES + gap_frames);
    assert_eq!(playback.frame_count, expected_frames);
    assert_eq!(playback.format, AudioFormat::new(16000, 1, 2));

    // The container decodes back to exactly the assembled samples
    let decoded = AudioClip::from_wav(&playback.wav).unwrap();
    assert_eq!(decoded.format, playback.format);
    assert_eq!(decoded.pcm.len(), expected_frames * 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_lay_tracks_out_in_playback_order(ctx: &TestContext) {
    let record = ctx.fixtures.create_phrase("順番の文。", 5).await.unwrap();

    let session = ctx.phrase_service.find(&record.hash).await.unwrap();
    let decoded = AudioClip::from_wav(&session.playback.unwrap().wav).unwrap();

    let block = decoded.format.block_align();
    let track_bytes = FAKE_TRACK_FRAMES * block;
    let gap_bytes = SILENCE_GAP_SECS as usize * decoded.format.sample_rate as usize * block;

    let mut offset = 0;
    for key in ctx.playback_order.keys() {
        let stored = ctx.track_repo.get(&record.hash, key).await.unwrap();
        assert_eq!(&decoded.pcm[offset..offset + track_bytes], stored.pcm.as_slice(), "{key}");
        offset += track_bytes;

        let gap = &decoded.pcm[offset..offset + gap_bytes];
        assert!(gap.iter().all(|&b| b == 0), "gap after {key} is not silent");
        offset += gap_bytes;
    }
    assert_eq!(offset, decoded.pcm.len());
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_use_midpoint_silence_for_unsigned_samples(ctx: &TestContext) {
    let format = AudioFormat::new(8000, 1, 1);
    let record = ctx
        .fixtures
        .create_phrase_with_format("八ビットの文。", 5, format, 800)
        .await
        .unwrap();

    let session = ctx.phrase_service.find(&record.hash).await.unwrap();
    let playback = session.playback.unwrap();
    let decoded = AudioClip::from_wav(&playback.wav).unwrap();

    assert_eq!(playback.frame_count, VOICES * (800 + 2 * 8000));
    let tail = &decoded.pcm[decoded.pcm.len() - 2 * 8000..];
    assert!(tail.iter().all(|&b| b == 0x80));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_account_frames_for_stereo_tracks(ctx: &TestContext) {
    let format = AudioFormat::new(22050, 2, 2);
    let record = ctx
        .fixtures
        .create_phrase_with_format("ステレオの文。", 5, format, 441)
        .await
        .unwrap();

    let playback = ctx
        .phrase_service
        .find(&record.hash)
        .await
        .unwrap()
        .playback
        .unwrap();

    let expected_frames = VOICES * (441 + 2 * 22050);
    assert_eq!(playback.frame_count, expected_frames);
    assert!((playback.duration_secs() - expected_frames as f64 / 22050.0).abs() < 1e-9);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_to_mix_formats(ctx: &TestContext) {
    ctx.fixtures.create_phrase("普通の文。", 20).await.unwrap();
    ctx.fixtures
        .create_phrase_with_format("別形式の文。", 10, AudioFormat::new(22050, 1, 2), 100)
        .await
        .unwrap();

    let result = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Recency, 2)
        .await;

    match result {
        Err(PhraseServiceError::Playback(PlaybackError::FormatMismatch { expected, found, .. })) => {
            assert_eq!(expected, AudioFormat::new(16000, 1, 2));
            assert_eq!(found, AudioFormat::new(22050, 1, 2));
        }
        other => panic!("expected format mismatch, got {other:?}"),
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_refuse_mixed_formats_within_one_phrase(ctx: &TestContext) {
    ctx.speaker.set_format("zh", AudioFormat::new(24000, 1, 2));
    let record = ctx.phrase_service.generate("混在の文。".to_string()).await.unwrap();

    let result = ctx.phrase_service.find(&record.hash).await;

    assert!(matches!(
        result,
        Err(PhraseServiceError::Playback(PlaybackError::FormatMismatch { .. }))
    ));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_report_corrupt_tracks(ctx: &TestContext) {
    let record = ctx.fixtures.create_phrase("壊れた文。", 5).await.unwrap();
    ctx.fixtures.corrupt_track(&record.hash, "en").await.unwrap();

    let result = ctx.phrase_service.find(&record.hash).await;

    assert!(matches!(
        result,
        Err(PhraseServiceError::Playback(PlaybackError::CorruptTrack(_)))
    ));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_keep_usage_bump_when_assembly_fails(ctx: &TestContext) {
    let record = ctx.fixtures.create_phrase("壊れた文。", 5).await.unwrap();
    ctx.fixtures.corrupt_track(&record.hash, "ja-kazuha").await.unwrap();

    let result = ctx
        .phrase_service
        .retrieve(SelectionPolicy::Frequency, 1)
        .await;

    assert!(result.is_err());
    assert_eq!(ctx.fixtures.usage_count(&record.hash).await.unwrap(), Some(1));
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_encode_playback_as_wav_data_uri(ctx: &TestContext) {
    use base64::Engine;

    let record = ctx.fixtures.create_phrase("データの文。", 5).await.unwrap();
    let playback = ctx
        .phrase_service
        .find(&record.hash)
        .await
        .unwrap()
        .playback
        .unwrap();

    let uri = playback.to_data_uri();
    let encoded = uri.strip_prefix("data:audio/wav;base64,").unwrap();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .unwrap();

    assert_eq!(bytes, playback.wav);
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
}
