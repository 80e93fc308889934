// 経過時間フォーマット
//
// ログとサマリーで使う `mm:ss.SSSs` 形式を提供します。

use chrono::Duration;

/// 経過時間を `mm:ss.SSSs` 形式に整形
///
/// 負の値は0として扱います。60分以上は分の桁が増えます。
///
/// # Examples
/// ```
/// use chrono::Duration;
/// use strata_lifecycle::services::time_format::format_duration;
/// assert_eq!(format_duration(Duration::milliseconds(61_005)), "01:01.005s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    format_millis(duration.num_milliseconds().max(0) as u64)
}

/// ミリ秒を `mm:ss.SSSs` 形式に整形
pub fn format_millis(millis: u64) -> String {
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1_000;
    let millis = millis % 1_000;
    format!("{:02}:{:02}.{:03}s", minutes, seconds, millis)
}
