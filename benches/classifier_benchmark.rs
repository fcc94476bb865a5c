use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use spamsieve::{
    load_csv, ClassifierBuilder, FeatureExtractor, FittedVectorizer, MultinomialNb, TextEncoding,
    TfidfVectorizer,
};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/sms_small.csv");

const SHORT_TEXT: &str = "Hey, are we still meeting for lunch tomorrow?";
const LONG_TEXT: &str = "WINNER! Your free entry to the contest is confirmed! Text STOP to 8888 \
     for cancellation. This is a much longer message that keeps going with more words, \
     more punctuation and more numbers like 0800 123 456 so that tokenizing and looking \
     up terms has real work to do. Reply now to claim your free prize before the offer \
     ends, standard rates apply, see the website for terms and conditions.";

fn setup() -> (Vec<String>, FittedVectorizer, MultinomialNb) {
    let dataset = load_csv(FIXTURE, TextEncoding::Latin1).unwrap();
    let texts: Vec<String> = dataset.texts().into_iter().map(String::from).collect();
    let (vectorizer, matrix) = TfidfVectorizer::new().fit_transform(&texts).unwrap();
    let classifier = ClassifierBuilder::new()
        .with_n_features(vectorizer.n_features())
        .unwrap()
        .fit(&matrix, &dataset.labels())
        .unwrap();
    (texts, vectorizer, classifier)
}

fn bench_vectorizer(c: &mut Criterion) {
    let (texts, vectorizer, _) = setup();
    let mut group = c.benchmark_group("Vectorizer");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("fit_corpus", |b| {
        b.iter(|| TfidfVectorizer::new().fit(black_box(&texts)).unwrap())
    });
    group.bench_function("transform_short", |b| {
        b.iter(|| vectorizer.transform(black_box(SHORT_TEXT)))
    });
    group.bench_function("transform_long", |b| {
        b.iter(|| vectorizer.transform(black_box(LONG_TEXT)))
    });

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let (texts, vectorizer, classifier) = setup();
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for (name, text) in [("short", SHORT_TEXT), ("long", LONG_TEXT)] {
        let vector = vectorizer.transform(text);
        group.bench_with_input(BenchmarkId::new("predict", name), &vector, |b, v| {
            b.iter(|| classifier.predict(black_box(v)).unwrap())
        });
    }

    let matrix = vectorizer.transform_batch(&texts);
    group.bench_function("predict_batch_corpus", |b| {
        b.iter(|| classifier.predict_batch(black_box(&matrix)).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_vectorizer, bench_prediction);
criterion_main!(benches);
