//! Built-in problem set. Guarantees the coach is usable without any config file.

use crate::domain::{Difficulty, Problem, TestCase};

fn cases(pairs: &[(&str, &str)]) -> Vec<TestCase> {
  pairs
    .iter()
    .map(|(i, o)| TestCase { input: (*i).into(), output: (*o).into() })
    .collect()
}

fn hints(items: &[&str]) -> Vec<String> {
  items.iter().map(|s| (*s).to_string()).collect()
}

/// The classic practice problems shipped with the coach.
pub fn seed_problems() -> Vec<Problem> {
  vec![
    Problem {
      title: "两数之和".into(),
      title_en: Some("Two Sum".into()),
      description: "给定一个整数数组 nums 和一个整数目标值 target，请你在该数组中找出和为目标值 target 的那两个整数，并返回它们的数组下标。\n\n你可以假设每种输入只会对应一个答案。但是，数组中同一个元素在答案里不能重复出现。".into(),
      difficulty: Difficulty::Easy,
      expected_complexity: "O(n) 时间, O(n) 空间".into(),
      test_cases: cases(&[
        ("nums = [2, 7, 11, 15], target = 9", "[0, 1]"),
        ("nums = [3, 2, 4], target = 6", "[1, 2]"),
        ("nums = [3, 3], target = 6", "[0, 1]"),
      ]),
      solution_hints: hints(&["考虑用哈希表存储已见过的数字", "对于每个数字，检查 target - num 是否在哈希表中"]),
    },
    Problem {
      title: "有效的括号".into(),
      title_en: Some("Valid Parentheses".into()),
      description: "给定一个只包括 '('，')'，'{'，'}'，'['，']' 的字符串 s ，判断字符串是否有效。\n\n有效字符串需满足：\n1. 左括号必须用相同类型的右括号闭合。\n2. 左括号必须以正确的顺序闭合。\n3. 每个右括号都有一个对应的相同类型的左括号。".into(),
      difficulty: Difficulty::Easy,
      expected_complexity: "O(n) 时间, O(n) 空间".into(),
      test_cases: cases(&[
        ("s = \"()\"", "true"),
        ("s = \"()[]{}\"", "true"),
        ("s = \"(]\"", "false"),
        ("s = \"([)]\"", "false"),
      ]),
      solution_hints: hints(&["使用栈来匹配括号", "遇到左括号入栈，遇到右括号出栈匹配"]),
    },
    Problem {
      title: "反转链表".into(),
      title_en: Some("Reverse Linked List".into()),
      description: "给你单链表的头节点 head ，请你反转链表，并返回反转后的链表。".into(),
      difficulty: Difficulty::Easy,
      expected_complexity: "O(n) 时间, O(1) 空间".into(),
      test_cases: cases(&[
        ("head = [1,2,3,4,5]", "[5,4,3,2,1]"),
        ("head = [1,2]", "[2,1]"),
        ("head = []", "[]"),
      ]),
      solution_hints: hints(&["使用三个指针：prev, curr, next", "迭代过程中逐个反转指针方向"]),
    },
    Problem {
      title: "二分查找".into(),
      title_en: Some("Binary Search".into()),
      description: "给定一个 n 个元素有序的（升序）整型数组 nums 和一个目标值 target，写一个函数搜索 nums 中的 target，如果目标值存在返回下标，否则返回 -1。".into(),
      difficulty: Difficulty::Easy,
      expected_complexity: "O(log n) 时间, O(1) 空间".into(),
      test_cases: cases(&[
        ("nums = [-1,0,3,5,9,12], target = 9", "4"),
        ("nums = [-1,0,3,5,9,12], target = 2", "-1"),
      ]),
      solution_hints: hints(&["维护左右边界，每次取中间", "根据中间值与目标的比较缩小范围"]),
    },
    Problem {
      title: "合并两个有序链表".into(),
      title_en: Some("Merge Two Sorted Lists".into()),
      description: "将两个升序链表合并为一个新的升序链表并返回。新链表是通过拼接给定的两个链表的所有节点组成的。".into(),
      difficulty: Difficulty::Easy,
      expected_complexity: "O(n+m) 时间, O(1) 空间".into(),
      test_cases: cases(&[
        ("l1 = [1,2,4], l2 = [1,3,4]", "[1,1,2,3,4,4]"),
        ("l1 = [], l2 = []", "[]"),
        ("l1 = [], l2 = [0]", "[0]"),
      ]),
      solution_hints: hints(&["使用虚拟头节点简化处理", "比较两个链表当前节点，选择较小的"]),
    },
    Problem {
      title: "最大子数组和".into(),
      title_en: Some("Maximum Subarray".into()),
      description: "给你一个整数数组 nums ，请你找出一个具有最大和的连续子数组（子数组最少包含一个元素），返回其最大和。\n\n子数组是数组中的一个连续部分。".into(),
      difficulty: Difficulty::Medium,
      expected_complexity: "O(n) 时间, O(1) 空间".into(),
      test_cases: cases(&[
        ("nums = [-2,1,-3,4,-1,2,1,-5,4]", "6"),
        ("nums = [1]", "1"),
        ("nums = [5,4,-1,7,8]", "23"),
      ]),
      solution_hints: hints(&["动态规划：dp[i] 表示以 i 结尾的最大子数组和", "Kadane 算法：维护当前和与最大和"]),
    },
    Problem {
      title: "爬楼梯".into(),
      title_en: Some("Climbing Stairs".into()),
      description: "假设你正在爬楼梯。需要 n 阶你才能到达楼顶。\n\n每次你可以爬 1 或 2 个台阶。你有多少种不同的方法可以爬到楼顶呢？".into(),
      difficulty: Difficulty::Easy,
      expected_complexity: "O(n) 时间, O(1) 空间".into(),
      test_cases: cases(&[("n = 2", "2"), ("n = 3", "3"), ("n = 4", "5")]),
      solution_hints: hints(&["动态规划：f(n) = f(n-1) + f(n-2)", "这实际上是斐波那契数列"]),
    },
    Problem {
      title: "零钱兑换".into(),
      title_en: Some("Coin Change".into()),
      description: "给你一个整数数组 coins ，表示不同面额的硬币；以及一个整数 amount ，表示总金额。\n\n计算并返回可以凑成总金额所需的最少的硬币个数。如果没有任何一种硬币组合能组成总金额，返回 -1。\n\n你可以认为每种硬币的数量是无限的。".into(),
      difficulty: Difficulty::Medium,
      expected_complexity: "O(amount * len(coins)) 时间".into(),
      test_cases: cases(&[
        ("coins = [1, 2, 5], amount = 11", "3"),
        ("coins = [2], amount = 3", "-1"),
        ("coins = [1], amount = 0", "0"),
      ]),
      solution_hints: hints(&["完全背包问题", "dp[i] 表示凑成金额 i 所需的最少硬币数"]),
    },
  ]
}
