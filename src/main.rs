fn main() -> anyhow::Result<()> {
    backtest_analytics_lib::run()
}
