use super::*;
use std::io::Cursor;

const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  cmn             --/M      Chinese_(Mandarin) sit/cmn              (zh-cmn 5)(zh 5)
 5  en-us           --/M      English_(America)  gmw/en-US            (en 3)
";

#[test]
fn parses_voice_table_with_aliases() {
    let voices = parse_voice_list(VOICES);
    assert_eq!(voices.len(), 3);
    assert_eq!(voices[0].id, "af");
    assert!(voices[0].aliases.is_empty());
    assert_eq!(voices[1].language, "cmn");
    assert_eq!(voices[1].name, "Chinese (Mandarin)");
    assert_eq!(voices[1].aliases, vec!["zh-cmn".to_string(), "zh".to_string()]);
    assert_eq!(voices[2].aliases, vec!["en".to_string()]);
}

#[test]
fn rate_and_pitch_map_to_espeak_scales() {
    assert_eq!(rate_to_wpm(1.0), 175);
    assert_eq!(rate_to_wpm(0.9), 158);
    assert_eq!(rate_to_wpm(0.01), 80);
    assert_eq!(rate_to_wpm(10.0), 450);
    assert_eq!(pitch_to_espeak(1.0), 50);
    assert_eq!(pitch_to_espeak(5.0), 99);
}

fn utterance(voice: Option<Voice>) -> Utterance {
    Utterance {
        text: "春天来了".to_string(),
        lang: "zh-CN".to_string(),
        rate: 1.0,
        pitch: 1.0,
        voice,
    }
}

#[test]
fn default_voice_leaves_voice_flag_off() {
    let args = speak_args(&utterance(None));
    assert!(!args.iter().any(|a| a == "-v"), "{args:?}");
    assert!(!args.iter().any(|a| a.eq_ignore_ascii_case("zh-cn")), "{args:?}");
    assert_eq!(&args[..2], ["--stdout", "--stdin"]);
}

#[test]
fn selected_voice_is_passed_by_id() {
    let voice = Voice::new("cmn", "Chinese (Mandarin)", "cmn").with_aliases(["zh"]);
    let args = speak_args(&utterance(Some(voice)));
    assert!(args.windows(2).any(|w| w == ["-v", "cmn"]), "{args:?}");
    assert!(args.windows(2).any(|w| w == ["-s", "175"]), "{args:?}");
}

fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buf = Cursor::new(Vec::new());
    {
        let mut w = hound::WavWriter::new(&mut buf, spec).unwrap();
        for &s in samples {
            w.write_sample(s).unwrap();
        }
        w.finalize().unwrap();
    }
    buf.into_inner()
}

#[test]
fn stream_wav_emits_chunks_in_order() {
    let samples: Vec<i16> = (0..5000).map(|i| (i % 100) as i16 * 100).collect();
    let bytes = wav_bytes(&samples, 22_050);

    let mut chunks = Vec::new();
    let flow = stream_wav(Cursor::new(bytes), &mut |e| {
        if let UtteranceEvent::Audio(c) = e {
            chunks.push(c);
        }
        ControlFlow::Continue(())
    })
    .unwrap();
    assert!(flow.is_continue());
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].samples.len(), CHUNK_FRAMES);
    assert_eq!(chunks[0].sample_rate, 22_050);
    let total: usize = chunks.iter().map(|c| c.samples.len()).sum();
    assert_eq!(total, 5000);
    assert!((chunks[0].samples[1] - 100.0 / 32768.0).abs() < 1e-6);
}

#[test]
fn stream_wav_tolerates_truncated_pipe_output() {
    let samples = vec![1000i16; 4000];
    let mut bytes = wav_bytes(&samples, 16_000);
    bytes.truncate(bytes.len() - 2000);

    let mut total = 0usize;
    stream_wav(Cursor::new(bytes), &mut |e| {
        if let UtteranceEvent::Audio(c) = e {
            total += c.samples.len();
        }
        ControlFlow::Continue(())
    })
    .unwrap();
    assert_eq!(total, 3000);
}

#[test]
fn stream_wav_stops_on_break() {
    let bytes = wav_bytes(&vec![0i16; 10_000], 16_000);
    let mut calls = 0;
    let flow = stream_wav(Cursor::new(bytes), &mut |_| {
        calls += 1;
        ControlFlow::Break(())
    })
    .unwrap();
    assert!(flow.is_break());
    assert_eq!(calls, 1);
}

#[test]
fn stream_wav_rejects_garbage() {
    let err = stream_wav(Cursor::new(b"not a wav".to_vec()), &mut |_| {
        ControlFlow::Continue(())
    })
    .unwrap_err();
    assert!(matches!(err, VoxframeError::Synthesis(_)));
}

#[test]
fn speaks_with_local_espeak_if_present() {
    let mut engine = EspeakEngine::default();
    if !engine.is_available() {
        return;
    }
    let utterance = Utterance {
        text: "hello".to_string(),
        lang: "en".to_string(),
        rate: 1.0,
        pitch: 1.0,
        voice: None,
    };
    let mut frames = 0usize;
    let mut ended = false;
    engine
        .speak(&utterance, &mut |e| {
            match e {
                UtteranceEvent::Audio(c) => frames += c.samples.len(),
                UtteranceEvent::End => ended = true,
                UtteranceEvent::Error(e) => panic!("espeak error: {e}"),
            }
            ControlFlow::Continue(())
        })
        .unwrap();
    assert!(ended);
    assert!(frames > 0);
}
