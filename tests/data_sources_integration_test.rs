//! Integration tests for external data sources
//!
//! No test here reaches the public exchange: responses are decoded from
//! literal bodies or served by a one-shot local listener, and failing
//! requests go to a closed local port.

#[cfg(feature = "async")]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use crypto_forecast::data::sources::{ChartDataSource, PoloniexSource};
    use crypto_forecast::error::ForecastError;
    use crypto_forecast::types::{ChartPeriod, CurrencyPair};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Answer a single HTTP request with `status` and `body`
    ///
    /// Returns the base URL to point the source at and a receiver for the
    /// request head the server saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&buf[..n]).into_owned());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{}", addr), rx)
    }

    const TWO_CANDLES: &str = r#"[
        {"date":1498867200,"high":"0.1303","low":"0.1290","open":"0.1299",
         "close":"0.1301","volume":"41.22","quoteVolume":"317.4","weightedAverage":"0.1298"},
        {"date":1498867500,"high":0.1305,"low":0.1297,"open":0.1301,
         "close":0.1304,"volume":22.1,"quoteVolume":169.8,"weightedAverage":0.1301}
    ]"#;

    #[tokio::test]
    async fn test_poloniex_source() {
        let source = PoloniexSource::new();
        assert!(source.is_ok());
        assert_eq!(source.unwrap().name(), "poloniex");
    }

    #[tokio::test]
    async fn test_empty_range_rejected_before_request() {
        let source = PoloniexSource::with_base_url("http://127.0.0.1:9").unwrap();
        let pair = CurrencyPair::default();
        let at = Utc.with_ymd_and_hms(2017, 7, 1, 0, 0, 0).unwrap();

        let result = source
            .fetch_chart_data(&pair, ChartPeriod::FiveMinutes, at, at)
            .await;
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_data_error() {
        let source = PoloniexSource::with_base_url("http://127.0.0.1:9").unwrap();
        let pair = CurrencyPair::default();
        let end = Utc.with_ymd_and_hms(2017, 7, 2, 0, 0, 0).unwrap();

        let result = source
            .fetch_chart_data(&pair, ChartPeriod::FiveMinutes, end - Duration::days(1), end)
            .await;
        assert!(matches!(result, Err(ForecastError::DataError(_))));
    }

    #[tokio::test]
    async fn test_server_error_status_is_data_error() {
        let (base_url, _request) = serve_once("500 Internal Server Error", r#"{"error":"down"}"#).await;
        let source = PoloniexSource::with_base_url(&base_url).unwrap();
        let end = Utc.with_ymd_and_hms(2017, 7, 2, 0, 0, 0).unwrap();

        let result = source
            .fetch_chart_data(&CurrencyPair::default(), ChartPeriod::FiveMinutes, end - Duration::days(1), end)
            .await;
        match result {
            Err(ForecastError::DataError(msg)) => assert!(msg.contains("500")),
            other => panic!("expected DataError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_chart_data_from_local_server() {
        let (base_url, request) = serve_once("200 OK", TWO_CANDLES).await;
        let source = PoloniexSource::with_base_url(&base_url).unwrap();
        let pair: CurrencyPair = "USDT_BTC".parse().unwrap();
        let end = Utc.with_ymd_and_hms(2017, 7, 2, 0, 0, 0).unwrap();
        let start = end - Duration::days(1);

        let candles = source
            .fetch_chart_data(&pair, ChartPeriod::FiveMinutes, start, end)
            .await
            .unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].date.timestamp(), 1_498_867_200);
        assert_eq!(candles[0].close, 0.1301);
        assert_eq!(candles[1].close, 0.1304);

        let head = request.await.unwrap();
        assert!(head.starts_with("GET /public?"));
        assert!(head.contains("command=returnChartData"));
        assert!(head.contains("currencyPair=USDT_BTC"));
        assert!(head.contains(&format!("start={}", start.timestamp())));
        assert!(head.contains(&format!("end={}", end.timestamp())));
        assert!(head.contains("period=300"));
    }

    #[tokio::test]
    async fn test_fetch_lookback_spans_requested_days() {
        let (base_url, request) = serve_once("200 OK", TWO_CANDLES).await;
        let source = PoloniexSource::with_base_url(&base_url).unwrap();

        let candles = source
            .fetch_lookback(&CurrencyPair::default(), ChartPeriod::FiveMinutes, 100)
            .await
            .unwrap();
        assert_eq!(candles.len(), 2);

        let head = request.await.unwrap();
        let param = |name: &str| -> i64 {
            let key = format!("{}=", name);
            let start = head.find(&key).unwrap() + key.len();
            head[start..]
                .split(|c: char| c == '&' || c == ' ')
                .next()
                .unwrap()
                .parse()
                .unwrap()
        };
        assert_eq!(param("end") - param("start"), 100 * 86_400);
        assert!(head.contains("currencyPair=BTC_ETH"));
    }

    #[test]
    fn test_decode_mixed_response() {
        let candles = PoloniexSource::parse_chart_data(TWO_CANDLES).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].date - candles[0].date, Duration::seconds(300));
        assert!(candles.iter().all(|c| c.low <= c.close && c.close <= c.high));
    }
}
