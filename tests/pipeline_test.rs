//! 浏览器集成测试
//!
//! 依赖本机可启动的 Chrome/Chromium，默认忽略。
//! 手动运行：cargo test -- --ignored

use solve_exam_submit::config::Config;
use solve_exam_submit::infrastructure::js_executor::js_string;
use solve_exam_submit::launch_headless_browser;
use solve_exam_submit::models::{AnswerRecord, QuestionType};
use solve_exam_submit::services::{AnswerInjector, QuestionExtractor, SubmitTrigger};
use solve_exam_submit::utils::logging;
use solve_exam_submit::{AppError, JsExecutor};

/// 考试页面夹具：默认选择器约定下的四个容器
///
/// 1. 单选题（带题组导语）  2. 没有题干节点的占位容器
/// 3. 填空题              4. 多选题
const FIXTURE_HTML: &str = r#"
<html><body>
  <div class="question-group">
    <div class="group-introduction">阅读  材料，回答
      下列问题</div>
    <div class="question-container">
      <div class="question-statement">下列哪个  是质数？</div>
      <div class="answer-choices">
        <input type="radio" name="q1"><label>4</label>
        <input type="radio" name="q1"><label>7</label>
        <input type="radio" name="q1"><label>9</label>
      </div>
    </div>
  </div>
  <div class="question-container"><em>广告位，不是题目</em></div>
  <div class="question-container">
    <div class="question-statement">重力加速度约为多少 m/s2 ？</div>
    <div class="free-response"><input type="text"></div>
  </div>
  <div class="question-container">
    <div class="question-statement">下列哪些是偶数？</div>
    <div class="answer-choices">
      <input type="checkbox"><label>1</label>
      <input type="checkbox"><label>2</label>
      <input type="checkbox"><label>3</label>
      <input type="checkbox"><label>4</label>
    </div>
  </div>
  <button id="exam-submit" onclick="window.__submitted = true">交卷</button>
</body></html>
"#;

async fn fixture_executor(html: &str) -> (chromiumoxide::Browser, JsExecutor) {
    logging::init();
    let (browser, page) = launch_headless_browser("about:blank")
        .await
        .expect("启动无头浏览器失败");
    let executor = JsExecutor::new(page);
    let script = format!(
        "(() => {{ document.open(); document.write({}); document.close(); return true; }})()",
        js_string(html)
    );
    executor.eval(script).await.expect("写入夹具页面失败");
    (browser, executor)
}

fn test_config() -> Config {
    Config {
        submit_settle_ms: 50,
        ..Config::default()
    }
}

#[tokio::test]
#[ignore]
async fn test_extract_from_fixture_page() {
    let (_browser, executor) = fixture_executor(FIXTURE_HTML).await;
    let extractor = QuestionExtractor::new(&test_config().selectors);

    let records = extractor.extract(&executor).await.expect("提取失败");

    // 四个容器里占位容器不产出记录，编号不前移
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].question_id, 1);
    assert_eq!(records[1].question_id, 3);
    assert_eq!(records[2].question_id, 4);

    assert_eq!(records[0].question_type, QuestionType::Mcq);
    assert_eq!(records[0].question_text, "下列哪个 是质数？");
    assert_eq!(records[0].case_study_text, "阅读 材料，回答 下列问题");
    assert_eq!(records[0].options, vec!["4", "7", "9"]);

    assert_eq!(records[1].question_type, QuestionType::Numerical);
    assert!(records[1].options.is_empty());
    assert_eq!(records[1].case_study_text, "");

    assert_eq!(records[2].question_type, QuestionType::Msq);
    assert_eq!(records[2].options.len(), 4);

    // 页面不变，两次提取结果一致
    let again = extractor.extract(&executor).await.expect("二次提取失败");
    assert_eq!(records, again);
}

#[tokio::test]
#[ignore]
async fn test_inject_choice_answer_and_idempotence() {
    let (_browser, executor) = fixture_executor(FIXTURE_HTML).await;
    let injector = AnswerInjector::new(&test_config().selectors);

    let answer = AnswerRecord {
        question_id: Some(1),
        question_type: Some(QuestionType::Mcq),
        option_indices: Some(vec![2]),
        ..Default::default()
    };

    let stats = injector.apply_all(&executor, &[answer.clone()]).await;
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.activations, 1);

    // 恰好第三个选项被选中，其余不动
    let checked: Vec<bool> = executor
        .eval_as(
            "Array.from(document.querySelectorAll('.question-container')[0]\
             .querySelectorAll('.answer-choices input')).map(i => i.checked)",
        )
        .await
        .expect("读取选中状态失败");
    assert_eq!(checked, vec![false, false, true]);

    // 幂等：重放同一条答案不产生新的模拟点击
    let stats = injector.apply_all(&executor, &[answer]).await;
    assert_eq!(stats.applied, 1);
    assert_eq!(stats.activations, 0);
}

#[tokio::test]
#[ignore]
async fn test_inject_numerical_answer_fires_events_in_order() {
    let (_browser, executor) = fixture_executor(FIXTURE_HTML).await;
    let injector = AnswerInjector::new(&test_config().selectors);

    // 站在宿主框架的视角记录事件
    executor
        .eval(
            "(() => { window.__events = []; \
             const input = document.querySelector('.free-response input'); \
             input.addEventListener('input', () => window.__events.push('input')); \
             input.addEventListener('change', () => window.__events.push('change')); \
             return true; })()",
        )
        .await
        .expect("安装事件记录器失败");

    let answer = AnswerRecord {
        question_id: Some(3),
        question_type: Some(QuestionType::Numerical),
        text_answer: Some("9.81".to_string()),
        ..Default::default()
    };
    let stats = injector.apply_all(&executor, &[answer]).await;
    assert_eq!(stats.applied, 1);

    let value: String = executor
        .eval_as("document.querySelector('.free-response input').value")
        .await
        .expect("读取输入值失败");
    assert_eq!(value, "9.81");

    let events: Vec<String> = executor
        .eval_as("window.__events")
        .await
        .expect("读取事件记录失败");
    assert_eq!(events, vec!["input", "change"]);
}

#[tokio::test]
#[ignore]
async fn test_out_of_range_answer_is_skipped() {
    let (_browser, executor) = fixture_executor(FIXTURE_HTML).await;
    let injector = AnswerInjector::new(&test_config().selectors);

    let answer = AnswerRecord {
        question_id: Some(99),
        question_type: Some(QuestionType::Mcq),
        option_indices: Some(vec![0]),
        ..Default::default()
    };
    let stats = injector.apply_all(&executor, &[answer]).await;
    assert_eq!(stats.applied, 0);
    assert_eq!(stats.skipped, 1);
}

#[tokio::test]
#[ignore]
async fn test_submit_trigger_clicks_button() {
    let (_browser, executor) = fixture_executor(FIXTURE_HTML).await;
    let submitter = SubmitTrigger::new(&test_config());

    submitter.trigger(&executor).await.expect("交卷失败");

    let submitted: bool = executor
        .eval_as("window.__submitted === true")
        .await
        .expect("读取交卷标记失败");
    assert!(submitted);
}

#[tokio::test]
#[ignore]
async fn test_submit_trigger_reports_missing_control() {
    // 没有交卷按钮的页面
    let (_browser, executor) = fixture_executor("<html><body><p>空页面</p></body></html>").await;
    let submitter = SubmitTrigger::new(&test_config());

    let err = submitter.trigger(&executor).await.unwrap_err();
    assert!(matches!(err, AppError::Submit(_)));
}
